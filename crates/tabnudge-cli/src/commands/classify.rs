use serde::Serialize;
use tabnudge_core::{Classification, Config};

#[derive(Serialize)]
struct Classified<'a> {
    url: &'a str,
    classification: Classification,
}

pub fn run(urls: &[String], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Config::load_or_default().classifier();
    let results: Vec<Classified> = urls
        .iter()
        .map(|url| Classified {
            url,
            classification: classifier.classify(url),
        })
        .collect();

    if json {
        super::print_json(&results)?;
    } else {
        for r in &results {
            println!("{}\t{}", r.classification, r.url);
        }
    }
    Ok(())
}
