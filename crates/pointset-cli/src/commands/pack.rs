use crate::cli::PackArgs;
use crate::config::PackManifest;
use crate::error::{CliError, Result};
use pointset::BinaryFormat;
use tracing::info;

pub fn run(args: PackArgs) -> Result<()> {
    info!("Loading pack manifest from {:?}", &args.input);
    let manifest = PackManifest::from_file(&args.input)?;
    let collection = manifest.build()?;

    info!("Writing {} to {:?}", collection, &args.output);
    collection
        .write_to_path(&args.output)
        .map_err(CliError::stream(&args.output))?;

    println!(
        "Packed {} array(s), {} set(s), {} point(s) into {}",
        collection.count(),
        collection.n_sets(),
        collection.n_points(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointset::PointSetCollection;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn packs_a_manifest_into_a_readable_collection() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("manifest.toml");
        let output = dir.path().join("out.psc");
        fs::write(
            &input,
            "[[arrays]]\nsets = [[[0.0, 0.0, 0.0]], [[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]]\n",
        )
        .unwrap();

        run(PackArgs {
            input,
            output: output.clone(),
        })
        .unwrap();

        let collection = PointSetCollection::read_from_path(&output).unwrap();
        assert_eq!(collection.set_counts(), vec![2]);
        assert_eq!(collection.n_points(), 3);
    }
}
