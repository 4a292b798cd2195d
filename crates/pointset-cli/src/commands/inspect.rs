use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use pointset::{BinaryFormat, PointSetCollection};
use std::fmt::Write;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Reading collection from {:?}", &args.input);
    let collection =
        PointSetCollection::read_from_path(&args.input).map_err(CliError::stream(&args.input))?;
    print!("{}", report(&collection, args.sets));
    Ok(())
}

/// Renders a human-readable summary of `collection`.
pub fn report(collection: &PointSetCollection, with_sets: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{collection}");
    for (i, array) in collection.iter().enumerate() {
        let _ = writeln!(
            out,
            "  array {i}: {} set(s), {} point(s), {}",
            array.count(),
            array.n_points(),
            array.bounding_box()
        );
        if with_sets {
            for (j, set) in array.iter().enumerate() {
                let _ = writeln!(out, "    set {j}: {set}");
            }
        }
    }
    out
}
