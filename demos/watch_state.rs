use std::error::Error;

use valetudo_client::stream::{Event, EventClient, EventEndpoint};

fn main() -> Result<(), Box<dyn Error>> {
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://vacuum.local".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = EventClient::new(&base_url)?;
        let mut subscription = client.subscribe("watch-state", EventEndpoint::StateAttributes);

        while let Some(event) = subscription.recv().await {
            match event {
                Event::Connected => println!("connected to {base_url}"),
                Event::StateAttributesUpdated(attributes) => {
                    for attribute in attributes {
                        println!("{attribute:?}");
                    }
                }
                Event::Disconnected | Event::CompletedWithError => {
                    println!("stream ended: {event:?}");
                    break;
                }
                other => println!("{other:?}"),
            }
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
