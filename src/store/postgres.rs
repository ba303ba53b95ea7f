use rocket_db_pools::sqlx::{self, PgPool, Postgres, QueryBuilder, migrate::Migrator, types::Json};

use super::{MessageFilter, MessageQuery, MessageStore, StoreError};
use crate::models::{Message, MessageRow};

const MESSAGE_COLUMNS: &str = "id, content, author_id, author_username, channel_id, channel_name, \
     guild_id, guild_name, thread_id, parent_id, created_at, updated_at, reply_to_id, \
     mentions_reply_target, attachments, embeds";

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending schema migrations. Already applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}

/// Message store over the `messages` table.
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert messages, replacing rows that already exist with the same id.
    pub async fn upsert_messages(&self, messages: &[Message]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for message in messages {
            let result = sqlx::query(
                r#"
                INSERT INTO messages (
                    id, content, author_id, author_username, channel_id, channel_name,
                    guild_id, guild_name, thread_id, parent_id, created_at, updated_at,
                    reply_to_id, mentions_reply_target, attachments, embeds
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ON CONFLICT (id) DO UPDATE SET
                    content = EXCLUDED.content,
                    author_username = EXCLUDED.author_username,
                    thread_id = EXCLUDED.thread_id,
                    reply_to_id = EXCLUDED.reply_to_id,
                    updated_at = EXCLUDED.updated_at,
                    attachments = EXCLUDED.attachments,
                    embeds = EXCLUDED.embeds
                "#,
            )
            .bind(&message.id)
            .bind(&message.content)
            .bind(&message.author_id)
            .bind(&message.author_username)
            .bind(&message.channel_id)
            .bind(&message.channel_name)
            .bind(&message.guild_id)
            .bind(&message.guild_name)
            .bind(&message.thread_id)
            .bind(&message.parent_id)
            .bind(message.created_at)
            .bind(message.updated_at)
            .bind(&message.reply_to_id)
            .bind(message.mentions_reply_target)
            .bind(Json(&message.attachments))
            .bind(Json(&message.embeds))
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &MessageFilter) {
    builder.push(" WHERE TRUE");

    let exact = [
        ("guild_id", &filter.guild_id),
        ("channel_id", &filter.channel_id),
        ("author_id", &filter.author_id),
        ("thread_id", &filter.thread_id),
    ];
    for (column, value) in exact {
        if let Some(value) = value {
            builder
                .push(" AND ")
                .push(column)
                .push(" = ")
                .push_bind(value.clone());
        }
    }

    if let Some(start) = filter.start {
        builder.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND created_at <= ").push_bind(end);
    }
}

#[rocket::async_trait]
impl MessageStore for PgMessageStore {
    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<Message>, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages"));
        push_filters(&mut builder, &query.filter);

        let direction = query.order.sql_keyword();
        builder
            .push(" ORDER BY created_at ")
            .push(direction)
            .push(", id ")
            .push(direction);

        if let Some(limit) = query.limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if query.offset > 0 {
            builder
                .push(" OFFSET ")
                .push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
        }

        let rows: Vec<MessageRow> = builder
            .build_query_as::<MessageRow>()
            .fetch_all(&self.pool)
            .await?;

        log::debug!("message store: {} rows for {:?}", rows.len(), query.filter);
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn count_messages(&self, filter: &MessageFilter) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM messages");
        push_filters(&mut builder, filter);

        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Message::from))
    }
}
