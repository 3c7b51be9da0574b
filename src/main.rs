use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docxide_merge::{
    Converter, Error, FillOptions, Length, LineMode, OfficeConverter, Mapping,
};

#[derive(Parser)]
#[command(name = "docxide-merge", version, about = "Mail-merge attendee data into DOCX templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one document per group of dataset rows using a named profile
    Batch {
        #[arg(short, long, default_value = "badges")]
        profile: String,
        /// Override the profile's template
        #[arg(long)]
        template: Option<PathBuf>,
        /// Override the profile's CSV dataset
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Skip PDF export
        #[arg(long)]
        no_pdf: bool,
        /// Office program used for PDF export
        #[arg(long, default_value = "soffice")]
        converter: PathBuf,
    },
    /// Fill a template from JSON placeholder maps
    Fill {
        template: PathBuf,
        output: PathBuf,
        /// JSON object of text placeholder → value
        #[arg(long)]
        text: Option<PathBuf>,
        /// JSON object of image placeholder → image path
        #[arg(long)]
        images: Option<PathBuf>,
        /// Image width in inches
        #[arg(long, default_value_t = 0.8)]
        width: f64,
        #[arg(long, default_value = ".")]
        image_root: PathBuf,
    },
    /// Fill table cells, writing each further line of a value as its own paragraph
    Split {
        template: PathBuf,
        output: PathBuf,
        /// JSON object of text placeholder → value
        #[arg(long)]
        text: PathBuf,
    },
    /// Replace paragraphs containing a placeholder with an image
    Image {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        placeholder: String,
        #[arg(long)]
        image: PathBuf,
        /// Image width in inches
        #[arg(long, default_value_t = 0.8)]
        width: f64,
    },
    /// Replace the first picture, keeping its width
    ReplaceImage {
        input: PathBuf,
        output: PathBuf,
        image: PathBuf,
    },
    /// Replace every picture in order with numbered images from a directory
    ReplaceImages {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "dummy_images")]
        pool: PathBuf,
    },
    /// Write numbered placeholder images
    DummyImages {
        #[arg(long, default_value = "dummy_images")]
        dir: PathBuf,
        #[arg(long, default_value_t = 30)]
        count: usize,
        #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,
    },
    /// List the built-in profiles
    Profiles,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Batch {
            profile,
            template,
            dataset,
            output_dir,
            no_pdf,
            converter,
        } => {
            let mut profile = docxide_merge::profile(&profile)?;
            if let Some(template) = template {
                profile.template = template;
            }
            if let Some(dataset) = dataset {
                profile.dataset = dataset;
            }
            if let Some(dir) = output_dir {
                profile.output_dir = dir;
            }
            let converter = OfficeConverter::new(converter);
            let converter = (!no_pdf).then_some(&converter as &dyn Converter);
            let report = docxide_merge::run_batch(&profile, converter)?;
            println!(
                "{} document(s), {} pdf(s), {} failed group(s), {} failed conversion(s)",
                report.documents.len(),
                report.pdfs.len(),
                report.failed_groups.len(),
                report.conversion_failures.len()
            );
        }
        Command::Fill {
            template,
            output,
            text,
            images,
            width,
            image_root,
        } => {
            let options = FillOptions {
                line_mode: LineMode::Breaks,
                image_width: Length::inches(width),
                image_root,
            };
            let text = load_optional(text)?;
            let images = load_optional(images)?;
            let report = docxide_merge::fill_template(&template, &output, &text, &images, &options)?;
            println!(
                "{} text and {} image replacement(s)",
                report.text.total(),
                report.images.total()
            );
        }
        Command::Split {
            template,
            output,
            text,
        } => {
            let options = FillOptions {
                line_mode: LineMode::Paragraphs,
                ..Default::default()
            };
            let text = docxide_merge::load_mapping(&text)?;
            let report = docxide_merge::fill_template(&template, &output, &text, &[], &options)?;
            println!("{} replacement(s)", report.text.total());
        }
        Command::Image {
            input,
            output,
            placeholder,
            image,
            width,
        } => {
            let count = docxide_merge::insert_image_in_file(
                &input,
                &output,
                &placeholder,
                &image,
                Length::inches(width),
            )?;
            println!("{} paragraph(s) replaced", count);
        }
        Command::ReplaceImage {
            input,
            output,
            image,
        } => {
            if docxide_merge::replace_image_in_file(&input, &output, &image)? {
                println!("Replaced first image → {}", output.display());
            } else {
                println!("No image found in {}", input.display());
            }
        }
        Command::ReplaceImages {
            input,
            output,
            pool,
        } => {
            let count = docxide_merge::replace_images_in_file(&input, &output, &pool)?;
            println!("{} image(s) replaced", count);
        }
        Command::DummyImages { dir, count, size } => {
            docxide_merge::create_dummy_images(&dir, count, size)?;
        }
        Command::Profiles => {
            for p in docxide_merge::builtin_profiles() {
                println!(
                    "{:<10} {} rows/doc  template={}  dataset={}  prefix={}  image width={:.2}\"",
                    p.name,
                    p.group_size,
                    p.template.display(),
                    p.dataset.display(),
                    p.output_prefix,
                    p.image_width.as_inches()
                );
            }
        }
    }
    Ok(())
}

fn load_optional(path: Option<PathBuf>) -> Result<Mapping, Error> {
    match path {
        Some(path) => docxide_merge::load_mapping(&path),
        None => Ok(Mapping::new()),
    }
}
