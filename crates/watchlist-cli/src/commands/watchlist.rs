use super::prompts;
use crate::output::Output;
use color_eyre::Result;
use tracing::info;
use watchlist_config::{Config, PathManager};
use watchlist_models::{WatchlistItem, WatchlistKey};
use watchlist_store::{open_store, WatchlistStore};

pub async fn run_watchlist(
    cmd: crate::WatchlistCommands,
    config: &Config,
    path_manager: &PathManager,
    output: &Output,
) -> Result<()> {
    let store = open_store(config, path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open watchlist storage: {}", e))?;

    // Mutations before hydration would be overwritten by it
    store.hydrate().await;

    let result = match cmd {
        crate::WatchlistCommands::List => list(&store, output),
        crate::WatchlistCommands::Add(args) => add(&store, args.into_item(), output),
        crate::WatchlistCommands::Remove { key, yes } => remove(&store, key, yes, output),
        crate::WatchlistCommands::Toggle(args) => toggle(&store, args.into_item(), output),
        crate::WatchlistCommands::Check { key } => check(&store, key, output),
        crate::WatchlistCommands::Clear { yes } => clear(&store, yes, output),
    };

    // Background writes die with the runtime, so wait for them before exiting
    store.flush().await;
    result
}

fn list(store: &WatchlistStore, output: &Output) -> Result<()> {
    output.watchlist(&store.items());
    Ok(())
}

fn add(store: &WatchlistStore, item: WatchlistItem, output: &Output) -> Result<()> {
    let key = item.key();

    if store.is_in_watchlist(key.id, key.media_type) {
        output.info(format!("{} is already in your watchlist", key));
        return Ok(());
    }

    store.add(item);
    info!("Added {} to watchlist", key);
    output.success(format!("Added {} to your watchlist", key));
    Ok(())
}

fn remove(store: &WatchlistStore, key: WatchlistKey, yes: bool, output: &Output) -> Result<()> {
    if !store.is_in_watchlist(key.id, key.media_type) {
        output.warn(format!("{} is not in your watchlist", key));
        return Ok(());
    }

    if !prompts::confirm_unless(yes, &format!("Remove {} from your watchlist?", key))? {
        output.info("Nothing removed");
        return Ok(());
    }

    store.remove(key.id, key.media_type);
    info!("Removed {} from watchlist", key);
    output.success(format!("Removed {} from your watchlist", key));
    Ok(())
}

fn toggle(store: &WatchlistStore, item: WatchlistItem, output: &Output) -> Result<()> {
    let key = item.key();
    store.toggle(item);

    if store.is_in_watchlist(key.id, key.media_type) {
        output.success(format!("Added {} to your watchlist", key));
    } else {
        output.success(format!("Removed {} from your watchlist", key));
    }
    Ok(())
}

fn check(store: &WatchlistStore, key: WatchlistKey, output: &Output) -> Result<()> {
    output.membership(key, store.is_in_watchlist(key.id, key.media_type));
    Ok(())
}

fn clear(store: &WatchlistStore, yes: bool, output: &Output) -> Result<()> {
    let count = store.len();
    if count == 0 {
        output.info("Your watchlist is already empty");
        return Ok(());
    }

    if !prompts::confirm_unless(yes, &format!("Remove all {} item(s) from your watchlist?", count))? {
        output.info("Nothing removed");
        return Ok(());
    }

    store.clear();
    info!("Cleared {} items from watchlist", count);
    output.success(format!("Cleared {} item(s) from your watchlist", count));
    Ok(())
}
