//! storemap administrator CLI
//!
//! Connects with `STOREMAP_DATABASE_URL` and acts as the user given by `--user`, so the
//! database's row-level policies decide what goes through.

mod terminal;

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing::Level;

use storemap_core::{
    creation::StorefrontDraft,
    images::{ImageDraft, ImageTarget},
    layers::tile_url,
    session::{Session, User},
    ClientConfig, Directory, Outcome, StorefrontPatch,
};
use storemap_proto::{CategoryId, ImageId, Location, StorefrontId};
use storemap_storage_postgres::PostgresStore;

use terminal::{HttpProbe, TerminalSink};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Act as this user id; without it requests run anonymously
    #[clap(long, global = true)]
    user: Option<String>,

    #[clap(long, global = true)]
    email: Option<String>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print the directory grouped by category
    List {
        /// Include unpublished storefronts
        #[clap(long)]
        all: bool,
    },
    /// Create a storefront at a map location
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        description: String,
        #[clap(long)]
        category: Option<CategoryId>,
        #[clap(long)]
        lat: f64,
        #[clap(long)]
        lng: f64,
    },
    /// Edit a storefront's title, description or category
    Edit {
        id: StorefrontId,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        category: Option<CategoryId>,
    },
    Publish {
        id: StorefrontId,
    },
    Unpublish {
        id: StorefrontId,
    },
    Delete {
        id: StorefrontId,
    },
    /// Storefront photos
    Images {
        #[clap(subcommand)]
        cmd: ImageCommand,
    },
    /// Print the map tile url template
    Tiles,
}

#[derive(clap::Subcommand, Debug)]
enum ImageCommand {
    List {
        storefront: StorefrontId,
    },
    Add {
        storefront: StorefrontId,
        #[clap(long)]
        url: String,
        #[clap(long)]
        description: String,
        #[clap(long)]
        credits: String,
    },
    Remove {
        storefront: StorefrontId,
        image: ImageId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = Args::parse();
    let config = ClientConfig::from_env()?;

    if let Command::Tiles = args.cmd {
        println!("{}", tile_url(&config.base_url));
        return Ok(());
    }

    let session = args.user.map(|id| Session { access_token: String::new(), user: User { id, email: args.email, identities: Vec::new() } });
    let store = PostgresStore::connect(&config).await?;

    let directory = Directory::new(Arc::new(store), Arc::new(TerminalSink)).with_toast_config(config.toasts).with_probe(Arc::new(HttpProbe::new()));
    directory.set_session(session).await;
    directory.refresher().refresh().await?;

    run(&directory, args.cmd).await
}

async fn run(directory: &Directory, cmd: Command) -> Result<()> {
    match cmd {
        Command::List { all } => {
            if all && !directory.toggle_edit_mode() {
                bail!("--all needs an administrator session");
            }
            for layer in directory.layers() {
                println!("{} ({})", layer.name, layer.markers.len());
                for marker in layer.markers {
                    let status = if marker.faded { " [unpublished]" } else { "" };
                    let location = marker.storefront.location;
                    println!("  {}  {}{status}  @ {:.4}, {:.4}", marker.storefront.id, marker.title, location.lat, location.lng);
                }
            }
        }
        Command::Create { title, description, category, lat, lng } => {
            if !directory.toggle_edit_mode() {
                bail!("creating storefronts needs an administrator session");
            }
            directory.edit_mode().choose_location(Location::new(lat, lng));
            directory.edit_mode().open_create_dialog();
            directory.creator().create(StorefrontDraft::new(title, description, category)).await?;
        }
        Command::Edit { id, title, description, category } => {
            let mut patch = StorefrontPatch::new();
            if let Some(title) = title {
                patch = patch.title(title);
            }
            if let Some(description) = description {
                patch = patch.description(Some(description));
            }
            if let Some(category) = category {
                patch = patch.category(Some(category));
            }
            reverted(directory.coordinator().apply_edit(id, patch).await?)?;
        }
        Command::Publish { id } => reverted(directory.coordinator().set_published(id, true).await?)?,
        Command::Unpublish { id } => reverted(directory.coordinator().set_published(id, false).await?)?,
        Command::Delete { id } => directory.coordinator().apply_delete(id).await?,
        Command::Images { cmd } => images(directory, cmd).await?,
        Command::Tiles => {}
    }
    Ok(())
}

async fn images(directory: &Directory, cmd: ImageCommand) -> Result<()> {
    let storefront_id = match &cmd {
        ImageCommand::List { storefront } | ImageCommand::Add { storefront, .. } | ImageCommand::Remove { storefront, .. } => *storefront,
    };
    let storefront = directory.cache().storefront(storefront_id).ok_or_else(|| anyhow!("no storefront {storefront_id}"))?;
    let images = directory.gallery().load(&storefront).await?;

    match cmd {
        ImageCommand::List { .. } => {
            for image in images {
                println!("{}  {}  {}", image.id, image.caption(), image.credit_line().unwrap_or_default());
            }
        }
        ImageCommand::Add { url, description, credits, .. } => {
            let draft = ImageDraft::new(url, description, credits);
            directory.gallery().save(&storefront, &ImageTarget::Create(storefront.id), &draft).await?;
        }
        ImageCommand::Remove { image, .. } => {
            let image = images.into_iter().find(|candidate| candidate.id == image).ok_or_else(|| anyhow!("no image {image}"))?;
            directory.gallery().delete(&storefront, &image).await?;
        }
    }
    Ok(())
}

fn reverted(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Reverted { reason } => Err(reason.into()),
    }
}
