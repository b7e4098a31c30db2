//! Asynchronous toolpath fetching with a stale-response guard.
//!
//! Every request gets a fresh [`RequestId`] and [`AbortSignal`]. Starting a
//! new request aborts the previous one, and any completion that does not
//! belong to the current request is dropped when the UI thread polls.

use crossbeam_channel::{Receiver, Sender};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use toolpath::{compute_metadata, GeometryMetadata, Point, ToolpathError};

/// Identity of one fetch. Monotonic per loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

/// Shared cancellation flag handed to a [`ToolpathSource`].
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns `Err(LoadError::Aborted)` once the request was superseded.
    pub fn check(&self) -> Result<(), LoadError> {
        if self.is_aborted() {
            Err(LoadError::Aborted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("request aborted")]
    Aborted,

    #[error(transparent)]
    Toolpath(#[from] ToolpathError),
}

/// Yields the point sequence for a file identifier.
pub trait ToolpathSource: Send + Sync + 'static {
    fn fetch(&self, path: &str, abort: &AbortSignal) -> Result<Vec<Point>, LoadError>;
}

/// Reads JSON toolpath files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ToolpathSource for FileSource {
    fn fetch(&self, path: &str, abort: &AbortSignal) -> Result<Vec<Point>, LoadError> {
        abort.check()?;
        let points = toolpath::read_file(&self.root.join(path))?;
        abort.check()?;
        Ok(points)
    }
}

/// A successfully loaded toolpath with its derived geometry.
#[derive(Debug)]
pub struct LoadedToolpath {
    pub request: RequestId,
    pub path: String,
    pub metadata: GeometryMetadata,
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Idle,
    Loading { request: RequestId, path: String },
    Loaded(Arc<LoadedToolpath>),
    Failed { path: String, message: String },
}

struct Completion {
    request: RequestId,
    path: String,
    result: Result<GeometryMetadata, LoadError>,
}

pub struct ToolpathLoader<S: ToolpathSource> {
    source: Arc<S>,
    next_id: u64,
    current: Option<(RequestId, AbortSignal)>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    state: LoadState,
}

impl<S: ToolpathSource> ToolpathLoader<S> {
    pub fn new(source: S) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            source: Arc::new(source),
            next_id: 0,
            current: None,
            tx,
            rx,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// The loaded toolpath, if the current request has resolved.
    pub fn loaded(&self) -> Option<&Arc<LoadedToolpath>> {
        match &self.state {
            LoadState::Loaded(loaded) => Some(loaded),
            _ => None,
        }
    }

    /// Starts fetching `path`, superseding any in-flight request.
    pub fn request(&mut self, path: impl Into<String>) -> RequestId {
        self.abort();

        let path = path.into();
        let request = RequestId(self.next_id);
        self.next_id += 1;
        let abort = AbortSignal::default();
        self.current = Some((request, abort.clone()));
        self.state = LoadState::Loading {
            request,
            path: path.clone(),
        };
        log::debug!("Toolpath request {:?} started for '{}'", request, path);

        let source = self.source.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source
                .fetch(&path, &abort)
                .and_then(|points| {
                    abort.check()?;
                    Ok(compute_metadata(&points))
                });
            // The receiver lives as long as the loader; a closed channel just
            // means the viewer is gone.
            let _ = tx.send(Completion {
                request,
                path,
                result,
            });
        });

        request
    }

    /// Aborts the in-flight request, if any. Its completion will be ignored.
    pub fn abort(&mut self) {
        if let Some((request, signal)) = self.current.take() {
            signal.abort();
            log::debug!("Toolpath request {:?} aborted", request);
            if matches!(self.state, LoadState::Loading { .. }) {
                self.state = LoadState::Idle;
            }
        }
    }

    /// Applies finished requests. Returns `true` if the state changed.
    pub fn poll(&mut self) -> bool {
        let completions: Vec<Completion> = self.rx.try_iter().collect();
        completions
            .into_iter()
            .fold(false, |changed, completion| self.apply(completion) || changed)
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for one completion.
    pub fn poll_timeout(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                let changed = self.apply(completion);
                self.poll() || changed
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, completion: Completion) -> bool {
        let is_current = matches!(self.current, Some((id, _)) if id == completion.request);
        if !is_current {
            log::debug!(
                "Discarding stale response {:?} for '{}'",
                completion.request,
                completion.path
            );
            return false;
        }
        self.current = None;

        self.state = match completion.result {
            Ok(metadata) => {
                log::info!(
                    "Loaded '{}': {} points, bounds min({:.3}, {:.3}, {:.3}) max({:.3}, {:.3}, {:.3}), travel {:.3} mm",
                    completion.path,
                    metadata.len(),
                    metadata.bounds.min.x,
                    metadata.bounds.min.y,
                    metadata.bounds.min.z,
                    metadata.bounds.max.x,
                    metadata.bounds.max.y,
                    metadata.bounds.max.z,
                    metadata.total_travel,
                );
                LoadState::Loaded(Arc::new(LoadedToolpath {
                    request: completion.request,
                    path: completion.path,
                    metadata,
                }))
            }
            Err(LoadError::Aborted) => LoadState::Idle,
            Err(err) => {
                log::error!("Failed to load '{}': {}", completion.path, err);
                LoadState::Failed {
                    path: completion.path,
                    message: err.to_string(),
                }
            }
        };
        true
    }
}

impl<S: ToolpathSource> Drop for ToolpathLoader<S> {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use glam::DVec3;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Serves canned toolpaths; paths listed in `gates` block until released.
    #[derive(Default)]
    struct FakeSource {
        paths: HashMap<String, Vec<Point>>,
        gates: Mutex<HashMap<String, Receiver<()>>>,
    }

    impl FakeSource {
        fn with(mut self, path: &str, points: Vec<Point>) -> Self {
            self.paths.insert(path.to_string(), points);
            self
        }

        fn gated(self, path: &str) -> (Self, Sender<()>) {
            let (tx, rx) = bounded(1);
            self.gates
                .lock()
                .unwrap()
                .insert(path.to_string(), rx);
            (self, tx)
        }
    }

    impl ToolpathSource for FakeSource {
        fn fetch(&self, path: &str, _abort: &AbortSignal) -> Result<Vec<Point>, LoadError> {
            let gate = self.gates.lock().unwrap().remove(path);
            if let Some(gate) = gate {
                gate.recv_timeout(WAIT).unwrap();
            }
            self.paths.get(path).cloned().ok_or_else(|| {
                LoadError::Toolpath(ToolpathError::Io {
                    path: path.into(),
                    source: std::io::ErrorKind::NotFound.into(),
                })
            })
        }
    }

    fn line(len: f64) -> Vec<Point> {
        vec![DVec3::ZERO, DVec3::new(len, 0.0, 0.0)]
    }

    #[test]
    fn resolves_current_request() {
        let mut loader = ToolpathLoader::new(FakeSource::default().with("a.json", line(2.0)));

        let id = loader.request("a.json");
        assert!(matches!(loader.state(), LoadState::Loading { request, .. } if *request == id));

        assert!(loader.poll_timeout(WAIT));
        let loaded = loader.loaded().expect("loaded");
        assert_eq!(loaded.request, id);
        assert_eq!(loaded.metadata.total_travel, 2.0);
    }

    #[test]
    fn superseded_response_is_discarded() {
        let (source, release_a) = FakeSource::default()
            .with("a.json", line(1.0))
            .with("b.json", line(5.0))
            .gated("a.json");
        let mut loader = ToolpathLoader::new(source);

        let _a = loader.request("a.json");
        let b = loader.request("b.json");

        assert!(loader.poll_timeout(WAIT));
        assert_eq!(loader.loaded().unwrap().request, b);

        // Let the stale request finish; it must not clobber b.
        release_a.send(()).unwrap();
        assert!(!loader.poll_timeout(WAIT));
        let loaded = loader.loaded().unwrap();
        assert_eq!(loaded.request, b);
        assert_eq!(loaded.metadata.total_travel, 5.0);
    }

    #[test]
    fn failure_becomes_error_state() {
        let mut loader = ToolpathLoader::new(FakeSource::default());

        loader.request("missing.json");
        assert!(loader.poll_timeout(WAIT));
        assert!(matches!(
            loader.state(),
            LoadState::Failed { path, .. } if path == "missing.json"
        ));
    }

    #[test]
    fn abort_returns_to_idle_and_ignores_completion() {
        let (source, release) = FakeSource::default()
            .with("a.json", line(1.0))
            .gated("a.json");
        let mut loader = ToolpathLoader::new(source);

        loader.request("a.json");
        loader.abort();
        assert!(matches!(loader.state(), LoadState::Idle));

        release.send(()).unwrap();
        assert!(!loader.poll_timeout(WAIT));
        assert!(matches!(loader.state(), LoadState::Idle));
    }

    #[test]
    fn file_source_honours_abort_and_reads_json() {
        let dir = std::env::temp_dir();
        let name = format!("toolpath-loader-test-{}.json", std::process::id());
        toolpath::write_file(&dir.join(&name), &line(3.0)).unwrap();

        let source = FileSource::new(&dir);
        let signal = AbortSignal::default();
        assert_eq!(source.fetch(&name, &signal).unwrap(), line(3.0));

        signal.abort();
        assert!(matches!(source.fetch(&name, &signal), Err(LoadError::Aborted)));
        let _ = std::fs::remove_file(dir.join(&name));
    }
}
