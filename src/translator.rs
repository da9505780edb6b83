use std::sync::Mutex;

use crate::errors::TranslationError;

/// Opaque batch sequence-to-sequence service: one best-hypothesis target token
/// sequence per input, in input order. Synchronous and blocking; the batch is
/// the full segment set of one document call, never chunked here.
pub trait BatchTranslator: Send + Sync {
    fn translate_batch(&self, batch: &[Vec<String>]) -> anyhow::Result<Vec<Vec<String>>>;
}

/// Run a batch through the translator and enforce its result-count contract.
/// A short or long result set must abort rather than silently misalign
/// segments to lines.
pub fn translate_checked(
    translator: &dyn BatchTranslator,
    batch: &[Vec<String>],
) -> Result<Vec<Vec<String>>, TranslationError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }
    let results = translator
        .translate_batch(batch)
        .map_err(|e| TranslationError::Backend(e.to_string()))?;
    if results.len() != batch.len() {
        return Err(TranslationError::CountMismatch {
            expected: batch.len(),
            returned: results.len(),
        });
    }
    Ok(results)
}

/// Serializes batch calls for engines that are not safe for concurrent
/// invocation. The integration contract requires either engine thread-safety
/// or one exclusive lock per bundle; this wrapper provides the latter.
pub struct SerialTranslator<T> {
    inner: Mutex<T>,
}

impl<T: BatchTranslator> SerialTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

impl<T: BatchTranslator> BatchTranslator for SerialTranslator<T> {
    fn translate_batch(&self, batch: &[Vec<String>]) -> anyhow::Result<Vec<Vec<String>>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("translator lock poisoned"))?;
        inner.translate_batch(batch)
    }
}
