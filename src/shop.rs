//! La barbería: un único agregado compartido por todos los agentes.
//!
//! Cada grupo de recursos tiene su propio lock (bancos, sillas, lavatorios,
//! pote, piso + banco de clientes, líneas de comunicación); no hay un lock
//! global. Los agentes solo tocan el estado a través de estos componentes.

use std::sync::Arc;

use crate::board::{NoBoard, Snapshot, StatusBoard};
use crate::config::{spend, ShopConfig};
use crate::error::Result;
use crate::lifecycle::ShopLifecycle;
use crate::line::CommunicationLine;
use crate::pool::{ResourcePool, StationRecord};
use crate::service::Station;
use crate::tools::ToolsPot;

pub struct BarberShop {
    config: ShopConfig,
    barber_bench: ResourcePool<()>,
    chairs: ResourcePool<StationRecord>,
    basins: ResourcePool<StationRecord>,
    tools: ToolsPot,
    floor: ShopLifecycle,
    line: CommunicationLine,
    board: Arc<dyn StatusBoard>,
}

impl BarberShop {
    pub fn new(config: ShopConfig, board: Arc<dyn StatusBoard>) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(BarberShop {
            barber_bench: ResourcePool::new("banco de barberos", config.barber_bench_seats),
            chairs: ResourcePool::new("sillas", config.chairs),
            basins: ResourcePool::new("lavatorios", config.basins),
            tools: ToolsPot::new(config.scissors, config.combs, config.razors),
            floor: ShopLifecycle::new(config.client_bench_seats),
            line: CommunicationLine::new(),
            board,
            config,
        }))
    }

    /// Sin tablero.
    pub fn quiet(config: ShopConfig) -> Result<Arc<Self>> {
        Self::new(config, Arc::new(NoBoard))
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn barber_bench(&self) -> &ResourcePool<()> {
        &self.barber_bench
    }

    pub fn chairs(&self) -> &ResourcePool<StationRecord> {
        &self.chairs
    }

    pub fn basins(&self) -> &ResourcePool<StationRecord> {
        &self.basins
    }

    pub fn stations(&self, station: Station) -> &ResourcePool<StationRecord> {
        match station {
            Station::Chair => &self.chairs,
            Station::Basin => &self.basins,
        }
    }

    pub fn tools(&self) -> &ToolsPot {
        &self.tools
    }

    pub fn floor(&self) -> &ShopLifecycle {
        &self.floor
    }

    pub fn line(&self) -> &CommunicationLine {
        &self.line
    }

    /// Disparador externo del cierre.
    pub fn close(&self) {
        self.floor.close();
    }

    pub fn is_open(&self) -> bool {
        self.floor.is_open()
    }

    /// Publica una foto en el tablero, después de la demora de "vitalidad".
    pub fn report(&self, snapshot: &Snapshot) {
        spend(self.config.vitality_time());
        self.board.report(snapshot);
    }
}
