//! Barbería con varios barberos, clientes y recursos compartidos.
//!
//! Generaliza el barbero dormilón: bancos de espera, sillas, lavatorios y un
//! pote de herramientas, cada grupo protegido por su propio monitor. Los
//! barberos atienden todo lo que pidió cada cliente (corte, afeitado, lavado)
//! y, al cerrar, terminan de atender a los que ya estaban esperando.

pub mod barber;
pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod line;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod shop;
pub mod simulation;
pub mod tools;

/// Los ids empiezan en 1; el 0 queda para "nadie".
pub type BarberId = usize;
pub type ClientId = usize;

pub use barber::{Barber, BarberReport, BarberState};
pub use board::{HistoryBoard, LogBoard, NoBoard, Role, Snapshot, StatusBoard, TextBoard};
pub use client::{Client, ClientReport, ClientState};
pub use config::ShopConfig;
pub use error::{Result, ShopError};
pub use scheduler::{Scheduler, ThreadScheduler, TokioScheduler};
pub use service::{Service, ServiceSet, Station, Tool, ToolSet};
pub use shop::BarberShop;
pub use simulation::{Simulation, SimulationReport};
