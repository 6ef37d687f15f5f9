//! Cómo se ejecutan los agentes. La vida de barberos y clientes es la misma;
//! lo único que cambia es quién la corre: un hilo del sistema por agente, o
//! el pool de tareas bloqueantes de un runtime de tokio.

use std::thread::{self, JoinHandle};

use crate::error::{Result, ShopError};

pub trait Scheduler {
    fn spawn<F, T>(&self, name: String, task: F) -> Result<Task<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static;
}

/// Agente en ejecución.
pub struct Task<T> {
    name: String,
    handle: Handle<T>,
}

enum Handle<T> {
    Thread(JoinHandle<T>),
    Blocking(tokio::runtime::Handle, tokio::task::JoinHandle<T>),
}

impl<T> Task<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Espera a que termine. Si el agente abortó (una aserción fatal) se
    /// reporta como `AgentPanicked`.
    pub fn join(self) -> Result<T> {
        let joined = match self.handle {
            Handle::Thread(handle) => handle.join().ok(),
            Handle::Blocking(runtime, handle) => runtime.block_on(handle).ok(),
        };
        joined.ok_or(ShopError::AgentPanicked(self.name))
    }
}

/// Un hilo con nombre por agente.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn spawn<F, T>(&self, name: String, task: F) -> Result<Task<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = thread::Builder::new().name(name.clone()).spawn(task)?;
        Ok(Task { name, handle: Handle::Thread(handle) })
    }
}

/// Los agentes corren en `spawn_blocking` de un runtime propio.
pub struct TokioScheduler {
    runtime: tokio::runtime::Runtime,
}

impl TokioScheduler {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("barberia")
            .build()?;
        Ok(TokioScheduler { runtime })
    }
}

impl Scheduler for TokioScheduler {
    fn spawn<F, T>(&self, name: String, task: F) -> Result<Task<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.runtime.spawn_blocking(task);
        Ok(Task { name, handle: Handle::Blocking(self.runtime.handle().clone(), handle) })
    }
}
