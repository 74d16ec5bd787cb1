use std::{fs::File, io::Read};

use argparse::{ArgumentParser, List, Store, StoreOption};
use gcm_sender::*;

#[tokio::main]
async fn main() -> Result<(), GcmError> {
    let mut api_key = String::new();
    let mut registration_ids: Vec<String> = Vec::new();
    let mut topic: Option<String> = None;
    let mut data_file: Option<String> = None;
    let mut endpoint: Option<String> = None;
    let mut ca_info: Option<String> = None;
    let mut title: Option<String> = None;
    let mut body: Option<String> = None;
    let mut ttl: Option<u32> = None;

    {
        let mut ap = ArgumentParser::new();
        ap.set_description("A GCM message sender");

        ap.refer(&mut api_key)
            .add_option(&["-k", "--api_key"], Store, "Server API key")
            .required();

        ap.refer(&mut topic)
            .add_option(&["--topic"], StoreOption, "Send to a topic instead of registration ids");

        ap.refer(&mut data_file)
            .add_option(&["-d", "--data_file"], StoreOption, "JSON file with the data payload");

        ap.refer(&mut endpoint)
            .add_option(&["-e", "--endpoint"], StoreOption, "Gateway endpoint override");

        ap.refer(&mut ca_info)
            .add_option(&["--ca_info"], StoreOption, "PEM file with the CA certificate to trust");

        ap.refer(&mut title)
            .add_option(&["--title"], StoreOption, "Notification title");

        ap.refer(&mut body)
            .add_option(&["--body"], StoreOption, "Notification body");

        ap.refer(&mut ttl)
            .add_option(&["-t", "--time_to_live"], StoreOption, "TTL of the message");

        ap.refer(&mut registration_ids)
            .add_argument("registration_ids", List, "Registration ids to send to");

        ap.parse_args_or_exit();
    }

    let mut config = SenderConfig::new(api_key);

    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(endpoint);
    }

    if let Some(path) = ca_info {
        config = config.with_ca_info_path(path);
    }

    let mut builder = match topic {
        Some(ref topic) => GcmMessageBuilder::new(Recipients::topic(topic)),
        None => GcmMessageBuilder::new(registration_ids),
    };

    if let Some(path) = data_file {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;

        let data: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)?;
        builder.set_data(data);
    }

    if title.is_some() || body.is_some() {
        builder.set_notification(Notification {
            title,
            body,
            ..Notification::default()
        });
    }

    if let Some(time) = ttl {
        builder.set_time_to_live(time);
    }

    let sender = GcmSender::new(config)?;

    match sender.send(&builder.build()).await {
        Ok(response) => {
            println!("Sent: {} ok, {} failed", response.success_count(), response.failure_count());

            for (old_id, new_id) in response.new_registration_ids() {
                println!("Replace {} with {}", old_id, new_id);
            }
            for id in response.invalid_registration_ids() {
                println!("Remove {}", id);
            }
            for id in response.unavailable_registration_ids() {
                println!("Retry {}", id);
            }
        }
        Err(error) => {
            println!("Error: {} ({})", error, error.short_description())
        }
    }

    Ok(())
}
