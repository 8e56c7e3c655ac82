use anyhow::Result;
use esgf_search::{Constraints, Record, SearchConnection};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configure the endpoint via ESGF_SEARCH_URL or a `.esgfsearchrc` file.
    let conn = SearchConnection::from_env()?;

    let ctx = conn.new_context(
        Constraints::new()
            .add("project", "CMIP5")
            .add("experiment", "historical")
            .add("variable", "tas"),
    )?;
    let counts = ctx.clone().with_facets(["model"]).facet_counts()?;
    if let Some(models) = counts.get("model") {
        println!("{} models", models.len());
    }

    let datasets = ctx.search()?;
    println!("{} datasets", datasets.len());

    for dataset in datasets.iter().take(3) {
        let dataset = dataset?;
        let Some(dataset) = dataset.as_dataset() else {
            continue;
        };
        println!("{}", dataset.dataset_id()?);

        let files = dataset.file_context()?.search_with(10, true)?;
        for file in files.iter().take(5) {
            let file = file?;
            if let Some(file) = file.as_file() {
                println!(
                    "  {} ({} bytes) {}",
                    file.filename()?,
                    file.size()?,
                    file.url().unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
