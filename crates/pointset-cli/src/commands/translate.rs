use crate::cli::TranslateArgs;
use crate::error::{CliError, Result};
use nalgebra::Vector3;
use pointset::{BinaryFormat, PointSetCollection};
use tracing::info;

pub fn run(args: TranslateArgs) -> Result<()> {
    info!("Reading collection from {:?}", &args.input);
    let mut collection =
        PointSetCollection::read_from_path(&args.input).map_err(CliError::stream(&args.input))?;

    translate(&mut collection, &args.delta, args.array)?;

    info!("Writing {} to {:?}", collection, &args.output);
    collection
        .write_to_path(&args.output)
        .map_err(CliError::stream(&args.output))?;

    println!("Translated collection written to {}", args.output.display());
    Ok(())
}

/// Moves every point of `collection`, or only those of array `array`.
pub fn translate(
    collection: &mut PointSetCollection,
    delta: &Vector3<f64>,
    array: Option<usize>,
) -> Result<()> {
    match array {
        Some(index) => {
            info!("Translating array {} by {:?}", index, delta);
            collection.translate_at(index, delta)?;
        }
        None => {
            info!("Translating every array by {:?}", delta);
            collection.translate(delta);
        }
    }
    Ok(())
}
