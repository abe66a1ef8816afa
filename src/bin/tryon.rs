use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tryon::models::config::{AppConfig, ClientConfig};
use tryon::models::gallery::{Gallery, Gender};
use tryon::models::image::ImageResource;
use tryon::services::gateway::{GenerationGateway, Route};
use tryon::services::gemini::GeminiClient;
use tryon::wizard::{DisplayedError, Guidance, Session, Step, Variant, Wizard, WizardError};

#[derive(Debug, Parser)]
#[command(name = "tryon", version, about = "Virtual try-on from the command line")]
struct Cli {
    /// Photo of the person.
    #[arg(long)]
    person: PathBuf,
    /// Photo of the clothing item.
    #[arg(long, conflicts_with = "outfit")]
    clothing: Option<PathBuf>,
    /// Name of a gallery outfit, e.g. "Черная футболка".
    #[arg(long, requires = "gender")]
    outfit: Option<String>,
    /// Gallery category for --outfit.
    #[arg(long)]
    gender: Option<Gender>,
    /// Proxy endpoint to post to.
    #[arg(long, env = "TRYON_PROXY_URL")]
    proxy_url: Option<String>,
    /// Call the model directly with the locally configured credential.
    #[arg(long, conflicts_with = "proxy_url")]
    direct: bool,
    /// Directory the result image is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// List the gallery outfits for --gender and exit.
    #[arg(long)]
    list_outfits: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut client_config = ClientConfig::from_env();
    if let Some(url) = &cli.proxy_url {
        client_config.proxy_url = url.clone();
    }
    let gallery = Gallery::new(&client_config.gallery_base_url);

    if cli.list_outfits {
        let gender = cli.gender.context("--list-outfits needs --gender")?;
        for outfit in gallery.outfits(gender) {
            println!("{}\t{}", outfit.name, outfit.url);
        }
        return Ok(());
    }

    let route = if cli.direct {
        let config = AppConfig::from_env();
        Route::Direct {
            gemini: GeminiClient::new(&config),
            credentials: config.credentials(),
        }
    } else {
        Route::Proxy {
            endpoint: client_config.proxy_url.clone(),
        }
    };
    let gateway = GenerationGateway::new(route, &client_config);

    let variant = if cli.outfit.is_some() { Variant::Gallery } else { Variant::Minimal };
    let session = Session::new(Wizard::new(variant, gallery), gateway);

    session.with(|w| -> Result<()> {
        w.select_person(ImageResource::from_path(&cli.person));
        match (&cli.clothing, &cli.outfit, cli.gender) {
            (Some(path), _, _) => w.select_clothing_file(ImageResource::from_path(path))?,
            (None, Some(name), Some(gender)) => {
                w.select_gender(gender)?;
                let url = w
                    .gallery()
                    .find_by_name(gender, name)
                    .map(|o| o.url.clone())
                    .with_context(|| format!("no outfit named {:?} for {}", name, gender))?;
                w.select_gallery_outfit(&url)?;
            }
            _ => {}
        }
        Ok(())
    })?;

    settle(session.generate().await)?;

    let (step, error) = session.with(|w| (w.step(), w.state().error.clone()));
    match step {
        Step::Result => {
            let path = session.download(&cli.out_dir).await?;
            println!("{}", path.display());
            Ok(())
        }
        _ => {
            let error = error.context("generation ended without a result")?;
            if let Some(hint) = credential_hint(&error) {
                eprintln!("{}", hint);
            }
            bail!(error.message)
        }
    }
}

/// Validation failures already left their message on the wizard's error
/// step; anything else aborts the run.
fn settle(result: Result<bool, WizardError>) -> Result<(), WizardError> {
    match result {
        Ok(_) | Err(WizardError::Validation(_)) => Ok(()),
        Err(err) => Err(err),
    }
}

fn credential_hint(error: &DisplayedError) -> Option<&'static str> {
    (error.guidance == Guidance::CredentialSetup)
        .then_some("Настройка API-ключа: следуйте инструкции сервера ниже и перезапустите его.")
}
