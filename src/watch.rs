//! File system watcher feeding the reactor.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   WatchMessage    ┌──────────────────────────────┐
//! │ notify       │──────────────────▶│ consumer thread              │
//! │ (src, i18n)  │      (mpsc)       │                              │
//! └──────────────┘                   │  Reactor::run()              │
//! ┌──────────────┐                   │   ├─ Change → handle()       │
//! │ Ctrl-C       │──── Close ───────▶│   ├─ Error  → log            │
//! └──────────────┘                   │   └─ Close / Stop → return   │
//!                                    └──────────────────────────────┘
//! ```
//!
//! The channel keeps events in arrival order and the single consumer
//! handles them one at a time.
//!
//! The polling backend reports a rename as a creation plus a removal. With
//! `[watch] poll = true` its events first pass through a pairing thread that
//! joins the two halves back into one rename, matched by file identity.

use crate::{
    config::SiteConfig,
    log,
    reactor::{ChangeEvent, Reactor, WatchMessage},
    site::{SiteBuilder, TranslationStore},
};
use anyhow::{Context, Result, anyhow};
use notify::{
    Event, EventKind, PollWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};
use walkdir::WalkDir;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Map a notify event onto reactor events.
///
/// Renames are taken from the paired `RenameMode::Both` event; the separate
/// `From`/`To` halves are dropped. A temp file renamed onto a real one is a
/// write to the real one. An unpaired rename is resolved by whether the path
/// still exists.
pub fn translate(event: Event) -> Vec<ChangeEvent> {
    let Event { kind, paths, .. } = event;

    if kind == EventKind::Modify(ModifyKind::Name(RenameMode::Both)) {
        let mut pair = paths.into_iter();
        return match (pair.next(), pair.next()) {
            (Some(from), Some(to)) => match (is_temp_file(&from), is_temp_file(&to)) {
                (false, false) => vec![ChangeEvent::Renamed { from, to }],
                // A temp file moved over the real one: the real one was written
                (true, false) => vec![ChangeEvent::Written(to)],
                (_, true) => Vec::new(),
            },
            _ => Vec::new(),
        };
    }

    let mut paths = paths.into_iter().filter(|p| !is_temp_file(p));
    match kind {
        EventKind::Create(_) => paths.map(ChangeEvent::Created).collect(),
        EventKind::Remove(_) => paths.map(ChangeEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::To)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .map(|p| {
                if p.exists() {
                    ChangeEvent::Created(p)
                } else {
                    ChangeEvent::Removed(p)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths.map(ChangeEvent::Written).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Forward notify results into the reactor's channel.
fn forward(tx: &Sender<WatchMessage>, result: notify::Result<Event>) {
    match result {
        Ok(event) => {
            for change in translate(event) {
                tx.send(WatchMessage::Change(change)).ok();
            }
        }
        Err(e) => {
            tx.send(WatchMessage::Error(e)).ok();
        }
    }
}

/// Identity of a file on disk, stable across renames.
///
/// Size and mtime are part of it so a deleted file's inode reused by a new
/// file within one scan is not mistaken for a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(unix), allow(dead_code))]
struct FileId {
    dev: u64,
    ino: u64,
    len: u64,
    mtime: (i64, i64),
}

#[cfg(unix)]
fn file_id(path: &Path) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    fs::symlink_metadata(path).ok().map(|m| FileId {
        dev: m.dev(),
        ino: m.ino(),
        len: m.len(),
        mtime: (m.mtime(), m.mtime_nsec()),
    })
}

#[cfg(not(unix))]
fn file_id(_path: &Path) -> Option<FileId> {
    None
}

/// Rejoins renames the polling backend splits into a removal and a creation.
///
/// Files under the watched directories are remembered by [`FileId`]; a
/// removed path whose id shows up again under a path created in the same
/// scan was renamed.
#[derive(Debug, Default)]
struct RenamePairer {
    ids: HashMap<PathBuf, FileId>,
}

impl RenamePairer {
    fn new(dirs: &[&Path]) -> Self {
        let ids = dirs
            .iter()
            .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(Result::ok))
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| Some((entry.path().to_path_buf(), file_id(entry.path())?)))
            .collect();
        Self { ids }
    }

    /// Turn the changes of one scan into their paired form, keeping order.
    /// A pair takes the place of its removal.
    fn pair(&mut self, changes: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
        let mut created_by_id = HashMap::new();
        for change in &changes {
            let (ChangeEvent::Created(path) | ChangeEvent::Written(path)) = change else {
                continue;
            };
            let Some(id) = file_id(path) else {
                continue;
            };
            self.ids.insert(path.clone(), id);
            if matches!(change, ChangeEvent::Created(_)) {
                created_by_id.insert(id, path.clone());
            }
        }

        let mut renamed_to = HashMap::new();
        for change in &changes {
            let ChangeEvent::Removed(from) = change else {
                continue;
            };
            let Some(id) = self.ids.get(from).copied() else {
                continue;
            };
            match created_by_id.get(&id) {
                Some(to) if to != from => {
                    self.ids.remove(from);
                    renamed_to.insert(from.clone(), to.clone());
                }
                _ if !from.exists() => {
                    self.ids.remove(from);
                }
                _ => {}
            }
        }

        let moved: HashSet<PathBuf> = renamed_to.values().cloned().collect();
        changes
            .into_iter()
            .filter_map(|change| match change {
                ChangeEvent::Created(path) if moved.contains(&path) => None,
                ChangeEvent::Removed(from) => Some(match renamed_to.remove(&from) {
                    Some(to) => ChangeEvent::Renamed { from, to },
                    None => ChangeEvent::Removed(from),
                }),
                other => Some(other),
            })
            .collect()
    }
}

/// Group the polling backend's messages by scan and pair renames before
/// they reach the reactor. A scan ends when no message arrives for `settle`.
fn pair_poll_events(
    raw: Receiver<WatchMessage>,
    tx: Sender<WatchMessage>,
    settle: Duration,
    mut pairer: RenamePairer,
) {
    while let Ok(first) = raw.recv() {
        let mut batch = vec![first];
        while let Ok(message) = raw.recv_timeout(settle) {
            batch.push(message);
        }

        let mut changes = Vec::new();
        for message in batch {
            match message {
                WatchMessage::Change(change) => changes.push(change),
                other => {
                    send_paired(&mut pairer, std::mem::take(&mut changes), &tx);
                    tx.send(other).ok();
                }
            }
        }
        send_paired(&mut pairer, changes, &tx);
    }
}

fn send_paired(pairer: &mut RenamePairer, changes: Vec<ChangeEvent>, tx: &Sender<WatchMessage>) {
    if changes.is_empty() {
        return;
    }
    for change in pairer.pair(changes) {
        tx.send(WatchMessage::Change(change)).ok();
    }
}

fn create_watcher(config: &SiteConfig, tx: Sender<WatchMessage>) -> Result<Box<dyn Watcher>> {
    if !config.watch.poll {
        let handler = move |result: notify::Result<Event>| forward(&tx, result);
        let watcher = notify::recommended_watcher(handler).context("Failed to create file watcher")?;
        return Ok(Box::new(watcher));
    }

    let (raw_tx, raw_rx) = mpsc::channel();
    let pairer = RenamePairer::new(&[config.source_dir(), config.i18n_dir()]);
    let settle = config.watch.poll_interval() / 2;
    thread::Builder::new()
        .name("pagewatch-poll".into())
        .spawn(move || pair_poll_events(raw_rx, tx, settle, pairer))
        .context("Failed to spawn the rename pairing thread")?;

    let handler = move |result: notify::Result<Event>| forward(&raw_tx, result);
    let poll_config = notify::Config::default().with_poll_interval(config.watch.poll_interval());
    let watcher = PollWatcher::new(handler, poll_config).context("Failed to create poll watcher")?;
    Ok(Box::new(watcher))
}

/// Format absolute path as relative to root, with trailing slash.
fn format_rel(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    format!("{}/", rel.display())
}

/// Watch the source and i18n directories. Failing to watch one is logged,
/// the other is still watched.
fn setup_watchers(watcher: &mut dyn Watcher, config: &SiteConfig) -> Vec<PathBuf> {
    let root = config.get_root();
    let mut watched = Vec::new();

    for dir in [config.source_dir(), config.i18n_dir()] {
        match watcher.watch(dir, RecursiveMode::Recursive) {
            Ok(()) => watched.push(dir.to_path_buf()),
            Err(e) => log!("error"; "couldn't add {} to the watcher: {e}", format_rel(dir, root)),
        }
    }

    if !watched.is_empty() {
        let dirs: Vec<_> = watched.iter().map(|d| format_rel(d, root)).collect();
        log!("watch"; "watching {}", dirs.join(", "));
    }
    watched
}

/// Watch for changes and feed them to `reactor` until the gallery page is
/// renamed, Ctrl-C is pressed, or the watcher goes away.
pub fn watch_for_changes_blocking<B, T>(config: &SiteConfig, mut reactor: Reactor<B, T>) -> Result<()>
where
    B: SiteBuilder + Send + 'static,
    T: TranslationStore + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let interrupt = tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt.send(WatchMessage::Close).ok();
    }) {
        log!("watch"; "couldn't install the Ctrl-C handler: {e}");
    }

    let mut watcher = create_watcher(config, tx)?;
    if setup_watchers(watcher.as_mut(), config).is_empty() {
        log!("error"; "nothing is being watched, changes will go unnoticed");
    }

    let consumer = thread::Builder::new()
        .name("pagewatch-reactor".into())
        .spawn(move || {
            reactor.run(rx);
            reactor
        })
        .context("Failed to spawn the reactor thread")?;

    let reactor = consumer
        .join()
        .map_err(|_| anyhow!("reactor thread panicked"))?;
    if reactor.is_stopped() {
        log!("watch"; "restart the watcher once the gallery references are fixed");
    }
    for orphaned in reactor.orphaned() {
        log!("warn"; "{} still point at {}", orphaned.dependents.display(), orphaned.page.display());
    }

    // Dropping the watcher stops the notification thread.
    drop(watcher);
    log!("watch"; "stopped watching");
    Ok(())
}
