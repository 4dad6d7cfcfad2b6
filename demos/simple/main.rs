use std::time::Duration;

use toggle_core::{ClientConfig, Context};

pub fn main() {
    env_logger::init();

    let base_url = std::env::var("TOGGLE_API_URL").unwrap();
    let client = ClientConfig::new("simple-demo", base_url)
        .custom_header("Authorization", std::env::var("TOGGLE_API_TOKEN").unwrap_or_default())
        .fetch_interval(Duration::from_secs(5))
        .to_client()
        .unwrap();

    // Toggles restored from the last run's backup are available right away.
    println!("Restored toggles: {:?}", client.toggle_names());

    // Start a scheduler thread to fetch toggles from the server.
    let scheduler = client.start_scheduler().unwrap();

    let context = Context::new().with_user_id("test-user");
    for _ in 0..6 {
        std::thread::sleep(Duration::from_secs(5));
        println!(
            "demo-toggle enabled: {}",
            client.is_enabled("demo-toggle", &context)
        );
    }

    scheduler.shutdown().unwrap();
}
