use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use exif_printer::export::write_export;
use exif_printer::settings::Resources;
use exif_printer::tags::reader::StaticMetadata;
use exif_printer::Session;
use std::path::{Path, PathBuf};

/// Draws the metadata overlay onto a photo and writes `<stem>_exif_printer.jpg`.
#[derive(Debug, Parser)]
#[command(name = "exif_printer", version)]
struct Args {
    /// Image to annotate
    #[arg(required_unless_present = "example")]
    image: Option<PathBuf>,

    /// JSON sidecar with the image's `exif`/`iptc` values
    #[arg(long)]
    tags: Option<PathBuf>,

    /// Folder holding `json/`, `fonts/` and icon files (defaults to the current directory)
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Theme name from the themes file
    #[arg(long)]
    theme: Option<String>,

    /// Output folder (defaults to the image's folder)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Append logs to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Use a random configured example when no image is given
    #[arg(long)]
    example: bool,

    /// Honour RUST_LOG and log at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    exif_printer::logging::init(args.debug, args.log.clone());

    let resources = Resources::from_dir(args.resources.clone().unwrap_or_else(|| PathBuf::from(".")));
    let mut session = Session::new();
    session.initialize(&resources);

    let image_path = match (&args.image, args.example) {
        (Some(path), _) => path.clone(),
        (None, true) => {
            let example = session
                .show_example(&mut rand::thread_rng())
                .ok_or_else(|| anyhow!("no examples configured"))?;
            resources.resolve(&example)
        }
        (None, false) => bail!("no image given"),
    };

    if let Some(theme) = &args.theme {
        if !session.set_theme(theme) {
            tracing::warn!(%theme, "keeping the current theme");
        }
    }

    let pixels = image::open(&image_path)
        .with_context(|| format!("open image {}", image_path.display()))?
        .to_rgba8();
    let (width, height) = pixels.dimensions();
    let file_name = image_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_owned();
    session.load_image(pixels, &file_name);

    let metadata = match &args.tags {
        Some(path) => StaticMetadata::load(path)?,
        None => StaticMetadata::default(),
    }
    .with_dimensions(width, height);
    session.read_metadata(&metadata);

    let Some(export) = session.export_jpeg()? else {
        bail!("nothing to export");
    };
    let out_dir = args
        .out
        .clone()
        .or_else(|| image_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = write_export(&out_dir, &export.file_name, &export.bytes)?;
    tracing::info!(path = %path.display(), "exported");
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn options_are_parsed() {
        let args = Args::try_parse_from([
            "exif_printer",
            "shot.jpg",
            "--tags",
            "shot.json",
            "--theme",
            "night",
            "--debug",
        ])
        .expect("parsed");
        assert_eq!(args.image, Some(PathBuf::from("shot.jpg")));
        assert_eq!(args.tags, Some(PathBuf::from("shot.json")));
        assert_eq!(args.theme.as_deref(), Some("night"));
        assert!(args.debug);
        assert!(!args.example);
    }

    #[test]
    fn image_is_optional_only_with_example() {
        assert!(Args::try_parse_from(["exif_printer"]).is_err());
        let args = Args::try_parse_from(["exif_printer", "--example"]).expect("parsed");
        assert!(args.image.is_none());
        assert!(Args::try_parse_from(["exif_printer", "a.jpg", "--bogus"]).is_err());
    }
}
