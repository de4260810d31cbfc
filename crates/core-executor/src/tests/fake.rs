use crate::engine::{BatchCursor, Engine, Session};
use crate::error::{ExecutionError, ExecutionResult};
use crate::models::{CellValue, ColumnDescriptor, ResultBatch};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub enum Step {
    Batch(Vec<Vec<CellValue>>),
    Fail(String),
}

#[derive(Default)]
pub struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    pulled: AtomicUsize,
}

struct Script {
    columns: Arc<[ColumnDescriptor]>,
    steps: Vec<Step>,
    execute_error: Option<String>,
    counters: Counters,
}

/// Scripted engine: every session replays the same batches and counts how
/// often sessions are handed out, closed, and pulled from.
#[derive(Clone)]
pub struct FakeEngine {
    script: Arc<Script>,
}

impl FakeEngine {
    pub fn new(columns: Vec<ColumnDescriptor>, steps: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Script {
                columns: columns.into(),
                steps,
                execute_error: None,
                counters: Counters::default(),
            }),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            script: Arc::new(Script {
                columns: Vec::new().into(),
                steps: Vec::new(),
                execute_error: Some(message.to_string()),
                counters: Counters::default(),
            }),
        }
    }

    pub fn acquired(&self) -> usize {
        self.script.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.script.counters.released.load(Ordering::SeqCst)
    }

    pub fn pulled(&self) -> usize {
        self.script.counters.pulled.load(Ordering::SeqCst)
    }

    /// Waits for the blocking worker to close its session.
    pub async fn wait_released(&self, expected: usize) -> usize {
        for _ in 0..500 {
            if self.released() >= expected {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.released()
    }
}

impl Engine for FakeEngine {
    fn connect(&self) -> ExecutionResult<Box<dyn Session>> {
        self.script.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: Arc::clone(&self.script),
        }))
    }

    fn version(&self) -> String {
        "v0.0.0-fake".to_string()
    }
}

struct FakeSession {
    script: Arc<Script>,
}

impl Session for FakeSession {
    fn execute(&mut self, _query: &str) -> ExecutionResult<Box<dyn BatchCursor + '_>> {
        if let Some(message) = &self.script.execute_error {
            return Err(ExecutionError::query(message));
        }
        Ok(Box::new(FakeCursor {
            script: &self.script,
            position: 0,
        }))
    }

    fn describe(&mut self, _query: &str) -> ExecutionResult<Vec<ColumnDescriptor>> {
        if let Some(message) = &self.script.execute_error {
            return Err(ExecutionError::query(message));
        }
        Ok(self.script.columns.to_vec())
    }

    fn close(self: Box<Self>) {
        self.script.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeCursor<'a> {
    script: &'a Script,
    position: usize,
}

impl BatchCursor for FakeCursor<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.script.columns
    }

    fn next_batch(&mut self) -> ExecutionResult<Option<ResultBatch>> {
        let Some(step) = self.script.steps.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        self.script.counters.pulled.fetch_add(1, Ordering::SeqCst);
        match step {
            Step::Batch(rows) => Ok(Some(ResultBatch::new(
                Arc::clone(&self.script.columns),
                rows.clone(),
            ))),
            Step::Fail(message) => Err(ExecutionError::query(message)),
        }
    }
}
