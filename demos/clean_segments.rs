use std::error::Error;

use valetudo_client::rest::RestClient;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://vacuum.local".to_string());
    let wanted: Vec<String> = args.collect();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = RestClient::new(&base_url)?;

        let info = client.fetch_info().await?;
        println!("{} {}", info.manufacturer, info.model_name);

        let segments = client.fetch_segments().await?;
        for segment in &segments {
            println!(
                "segment id={} name={}",
                segment.id,
                segment.name.as_deref().unwrap_or("<unnamed>")
            );
        }

        // Clean the named segments, or all of them when none were given.
        let selected: Vec<_> = if wanted.is_empty() {
            segments
        } else {
            segments
                .into_iter()
                .filter(|segment| {
                    segment
                        .name
                        .as_deref()
                        .is_some_and(|name| wanted.iter().any(|w| w == name))
                })
                .collect()
        };
        if selected.is_empty() {
            println!("no matching segments");
            return Ok(());
        }

        client.clean_segments(&selected).await?;
        println!("cleaning {} segment(s)", selected.len());

        Ok::<(), Box<dyn Error>>(())
    })
}
