use crate::events::AppEvent;
use async_channel::Sender;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

fn is_reload(kind: &EventKind, paths: &[PathBuf], config_path: &Path) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && paths.iter().any(|p| p == config_path)
}

type WatchEvents = async_channel::Receiver<notify::Result<notify::Event>>;

/// Watches the directory holding `config_path`, which must already exist.
fn watch_parent(config_path: &Path) -> notify::Result<(RecommendedWatcher, WatchEvents)> {
    let dir = config_path
        .parent()
        .ok_or_else(|| notify::Error::path_not_found().add_path(config_path.to_path_buf()))?;

    let (events_tx, events) = async_channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = events_tx.send_blocking(res);
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, events))
}

/// Sends [`AppEvent::ConfigReload`] whenever the settings file changes.
/// The file itself may be created after startup.
pub async fn run_async_watcher(tx: Sender<AppEvent>, config_path: PathBuf) {
    let (_watcher, events) = match watch_parent(&config_path) {
        Ok(watch) => watch,
        Err(e) => {
            log::warn!("Not watching {}: {}", config_path.display(), e);
            return;
        }
    };
    log::debug!("Watching {}", config_path.display());

    while let Ok(res) = events.recv().await {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                log::error!("Watch error: {}", e);
                continue;
            }
        };
        if is_reload(&event.kind, &event.paths, &config_path)
            && tx.send(AppEvent::ConfigReload).await.is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn only_changes_to_the_settings_file_reload() {
        let config = PathBuf::from("/tmp/arc-knob/config.toml");
        let other = PathBuf::from("/tmp/arc-knob/other.toml");

        assert!(is_reload(
            &EventKind::Modify(ModifyKind::Any),
            &[config.clone()],
            &config
        ));
        assert!(is_reload(
            &EventKind::Create(CreateKind::File),
            &[other.clone(), config.clone()],
            &config
        ));
        assert!(!is_reload(
            &EventKind::Modify(ModifyKind::Any),
            &[other],
            &config
        ));
        assert!(!is_reload(
            &EventKind::Access(AccessKind::Any),
            &[config.clone()],
            &config
        ));
    }
}
