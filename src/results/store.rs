use super::{Accumulator, ResultKey};
use crate::error::{ControllerError, ControllerResult};
use crate::events::{ControllerEvent, EventBroadcaster};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

const FILE_MAGIC: [u8; 4] = *b"TCRS";
const FILE_VERSION: u32 = 1;

#[derive(Default)]
struct StoreInner {
    results: HashMap<ResultKey, Vec<Arc<Accumulator>>>,
    last_produced: Option<Arc<Accumulator>>,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    magic: [u8; 4],
    version: u32,
    entries: Vec<(ResultKey, Vec<Arc<Accumulator>>)>,
}

/// Every result produced so far, grouped by (algorithm, problem).
///
/// One mutex guards the mapping and the last-produced pointer together, so
/// every operation (including `save`) observes a consistent state. A key is
/// never present with an empty sequence.
pub struct ResultStore {
    inner: Mutex<StoreInner>,
    events: Arc<EventBroadcaster>,
}

impl ResultStore {
    pub fn new(events: Arc<EventBroadcaster>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a result-set under `key` and marks it as the last produced.
    /// The model-changed notification is sent after the lock is released.
    pub fn add(&self, key: ResultKey, accumulator: Accumulator) {
        self.add_shared(key, Arc::new(accumulator));
    }

    fn add_shared(&self, key: ResultKey, accumulator: Arc<Accumulator>) {
        {
            let mut inner = self.lock();
            inner
                .results
                .entry(key)
                .or_default()
                .push(accumulator.clone());
            inner.last_produced = Some(accumulator);
        }
        self.events.notify(ControllerEvent::ModelChanged);
    }

    /// Result-sets stored under `key`, in insertion order. An absent key is
    /// reported as `NotFound` rather than an empty list.
    pub fn get(&self, key: &ResultKey) -> ControllerResult<Vec<Arc<Accumulator>>> {
        self.lock()
            .results
            .get(key)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound(format!("no results for {}", key)))
    }

    pub fn keys(&self) -> BTreeSet<ResultKey> {
        self.lock().results.keys().cloned().collect()
    }

    pub fn contains(&self, key: &ResultKey) -> bool {
        self.lock().results.contains_key(key)
    }

    /// Total number of stored result-sets across all keys.
    pub fn len(&self) -> usize {
        self.lock().results.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn last_produced(&self) -> Option<Arc<Accumulator>> {
        self.lock().last_produced.clone()
    }

    pub fn clear_last_produced(&self) {
        self.lock().last_produced = None;
    }

    /// Drops every result and the last-produced pointer. Does nothing, and
    /// notifies nobody, when the store is already empty.
    pub fn clear(&self) {
        {
            let mut inner = self.lock();
            if inner.results.is_empty() {
                return;
            }
            inner.results.clear();
            inner.last_produced = None;
        }
        self.events.notify(ControllerEvent::ModelChanged);
    }

    /// Serializes the full mapping. The store lock is held for the whole
    /// write, so concurrent `add` calls wait rather than tear the snapshot.
    pub fn save<W: Write>(&self, writer: W) -> ControllerResult<()> {
        let inner = self.lock();

        let mut entries: Vec<(ResultKey, Vec<Arc<Accumulator>>)> = inner
            .results
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let file = StoreFile {
            magic: FILE_MAGIC,
            version: FILE_VERSION,
            entries,
        };

        let mut writer = BufWriter::new(writer);
        bincode::serialize_into(&mut writer, &file).map_err(into_io_error)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ControllerResult<()> {
        let file = File::create(path.as_ref())?;
        self.save(file)?;
        info!("💾 Saved {} result sets to {:?}", self.len(), path.as_ref());
        Ok(())
    }

    /// Decodes a saved mapping and replays every entry through `add`, merging
    /// with whatever is already stored. Nothing is added unless the whole
    /// stream decodes. Returns the number of result-sets loaded.
    pub fn load<R: Read>(&self, mut reader: R) -> ControllerResult<usize> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let file: StoreFile = bincode::deserialize(&bytes)
            .map_err(|e| ControllerError::CorruptData(e.to_string()))?;

        if file.magic != FILE_MAGIC {
            return Err(ControllerError::CorruptData(
                "not a result store file".into(),
            ));
        }
        if file.version != FILE_VERSION {
            return Err(ControllerError::CorruptData(format!(
                "unsupported store file version {}",
                file.version
            )));
        }

        let mut loaded = 0;
        for (key, list) in file.entries {
            for accumulator in list {
                self.add_shared(key.clone(), accumulator);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> ControllerResult<usize> {
        let bytes = fs::read(path.as_ref())?;
        let loaded = self.load(bytes.as_slice())?;
        info!("📂 Loaded {} result sets from {:?}", loaded, path.as_ref());
        Ok(loaded)
    }
}

fn into_io_error(err: bincode::Error) -> ControllerError {
    match *err {
        bincode::ErrorKind::Io(e) => ControllerError::Io(e),
        other => ControllerError::Io(std::io::Error::other(other.to_string())),
    }
}
