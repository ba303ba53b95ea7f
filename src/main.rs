#[rocket::launch]
fn rocket() -> _ {
    log::info!("starting channel digest API server");
    channel_digest::rocket()
}
