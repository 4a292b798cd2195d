use crate::cli::ExtractArgs;
use crate::error::{CliError, Result};
use pointset::{BinaryFormat, PointSetCollection};
use tracing::info;

pub fn run(args: ExtractArgs) -> Result<()> {
    info!("Reading collection from {:?}", &args.input);
    let collection =
        PointSetCollection::read_from_path(&args.input).map_err(CliError::stream(&args.input))?;

    let extracted = extract(&collection, args.array, args.set)?;
    info!("Writing {} to {:?}", extracted, &args.output);
    extracted
        .write_to_path(&args.output)
        .map_err(CliError::stream(&args.output))?;

    println!(
        "Extracted {} set(s), {} point(s) into {}",
        extracted.n_sets(),
        extracted.n_points(),
        args.output.display()
    );
    Ok(())
}

/// Returns array `array` (or only set `set` of it) as a standalone collection.
pub fn extract(
    collection: &PointSetCollection,
    array: usize,
    set: Option<usize>,
) -> Result<PointSetCollection> {
    let selected = collection.at(array)?;
    Ok(match set {
        Some(set) => PointSetCollection::from(selected.at(set)?.extract()?),
        None => PointSetCollection::from(selected.extract()?),
    })
}
