use crate::catalogue::TRANSCODERS;
use crate::{DptError, Result, Transcoder};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Lookup of transcoders by `value_type` and by DPT main/sub number.
///
/// An absent sub number is its own key: `(9, None)` never matches `(9, Some(1))`.
#[derive(Debug, Default, Clone)]
pub struct TranscoderRegistry {
    entries: Vec<&'static Transcoder>,
    by_value_type: HashMap<&'static str, usize>,
    by_dpt_id: HashMap<(u16, Option<u16>), usize>,
}

impl TranscoderRegistry {
    /// Register every row of `table` in order, rejecting duplicate keys.
    pub fn new(table: &'static [Transcoder]) -> Result<Self> {
        let mut reg = Self::default();
        for transcoder in table {
            reg.register(transcoder)?;
        }
        Ok(reg)
    }

    fn register(&mut self, transcoder: &'static Transcoder) -> Result<()> {
        if self.by_value_type.contains_key(transcoder.value_type) {
            return Err(DptError::DuplicateValueType(transcoder.value_type));
        }
        let key = (transcoder.main, transcoder.sub);
        if self.by_dpt_id.contains_key(&key) {
            return Err(DptError::DuplicateDptId(transcoder.dpt_id()));
        }
        let idx = self.entries.len();
        self.entries.push(transcoder);
        self.by_value_type.insert(transcoder.value_type, idx);
        self.by_dpt_id.insert(key, idx);
        Ok(())
    }

    pub fn resolve_by_value_type(&self, value_type: &str) -> Result<&'static Transcoder> {
        self.by_value_type
            .get(value_type)
            .map(|idx| self.entries[*idx])
            .ok_or_else(|| DptError::NotFound(format!("value_type {value_type:?}")))
    }

    pub fn resolve_by_dpt_id(&self, main: u16, sub: Option<u16>) -> Result<&'static Transcoder> {
        self.by_dpt_id
            .get(&(main, sub))
            .map(|idx| self.entries[*idx])
            .ok_or_else(|| match sub {
                Some(sub) => DptError::NotFound(format!("DPT {main}.{sub:03}")),
                None => DptError::NotFound(format!("DPT {main}")),
            })
    }

    /// Resolve a `value_type`, falling back to DPT notation: `9.001`, `9`,
    /// `DPT9.001` or the ETS forms `DPST-9-1` / `DPT-9`.
    pub fn parse_transcoder(&self, query: &str) -> Result<&'static Transcoder> {
        let query = query.trim();
        if let Ok(transcoder) = self.resolve_by_value_type(query) {
            return Ok(transcoder);
        }
        match parse_dpt_id(query) {
            Some((main, sub)) => self.resolve_by_dpt_id(main, sub),
            None => Err(DptError::NotFound(format!("{query:?}"))),
        }
    }

    /// Transcoders in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Transcoder> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The process-wide registry over the static catalogue.
///
/// The catalogue is fixed at compile time; a duplicate key in it is a programming
/// error and aborts the process on first use.
pub fn global() -> &'static TranscoderRegistry {
    static GLOBAL: OnceLock<TranscoderRegistry> = OnceLock::new();
    GLOBAL.get_or_init(|| match TranscoderRegistry::new(TRANSCODERS) {
        Ok(reg) => {
            tracing::debug!(transcoders = reg.len(), "transcoder registry initialized");
            reg
        }
        Err(e) => {
            tracing::error!("invalid transcoder catalogue: {e}");
            std::process::abort()
        }
    })
}

fn parse_dpt_id(s: &str) -> Option<(u16, Option<u16>)> {
    if let Some(ets) = s.strip_prefix("DPST-") {
        let (main, sub) = ets.split_once('-')?;
        return Some((main.parse().ok()?, Some(sub.parse().ok()?)));
    }
    let s = s
        .strip_prefix("DPT-")
        .or_else(|| s.strip_prefix("DPT"))
        .unwrap_or(s)
        .trim();
    match s.split_once('.') {
        Some((main, sub)) => Some((main.parse().ok()?, Some(sub.parse().ok()?))),
        None => Some((s.parse().ok()?, None)),
    }
}
