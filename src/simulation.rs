//! Quien maneja la simulación desde afuera: arma la barbería, lanza barberos
//! y clientes, cierra cuando ya llegaron todos los clientes y espera que
//! cada agente termine.

use std::sync::Arc;

use rand::thread_rng;
use tracing::info;

use crate::barber::{Barber, BarberReport};
use crate::board::StatusBoard;
use crate::client::{Client, ClientReport};
use crate::config::{spend, ShopConfig};
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::service::ServiceSet;
use crate::shop::BarberShop;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub barbers: Vec<BarberReport>,
    pub clients: Vec<ClientReport>,
}

impl SimulationReport {
    pub fn served(&self) -> usize {
        self.clients.iter().filter(|client| client.is_complete()).count()
    }

    pub fn rejected(&self) -> usize {
        self.clients.iter().filter(|client| client.rejected).count()
    }
}

pub struct Simulation<S: Scheduler> {
    config: ShopConfig,
    scheduler: S,
    board: Arc<dyn StatusBoard>,
}

impl<S: Scheduler> Simulation<S> {
    pub fn new(config: ShopConfig, scheduler: S, board: Arc<dyn StatusBoard>) -> Self {
        Simulation { config, scheduler, board }
    }

    /// Corre con pedidos al azar (nunca vacíos).
    pub fn run(&self) -> Result<SimulationReport> {
        let mut rng = thread_rng();
        let requests = (0..self.config.clients).map(|_| ServiceSet::random(&mut rng)).collect();
        self.run_with(requests)
    }

    /// Corre con un pedido fijo por cliente (el cliente `i + 1` pide `requests[i]`).
    pub fn run_with(&self, requests: Vec<ServiceSet>) -> Result<SimulationReport> {
        let shop = BarberShop::new(self.config.clone(), self.board.clone())?;
        info!(barbers = self.config.barbers, clients = requests.len(), "barbería abierta");

        let barbers = (1..=self.config.barbers)
            .map(|id| {
                let shop = shop.clone();
                self.scheduler.spawn(format!("barbero-{id}"), move || Barber::new(id, shop).run())
            })
            .collect::<Result<Vec<_>>>()?;

        let arrivals = requests.len();
        let clients = requests
            .into_iter()
            .enumerate()
            .map(|(i, services)| {
                let shop = shop.clone();
                self.scheduler.spawn(format!("cliente-{}", i + 1), move || {
                    spend(shop.config().arrival_time());
                    Client::new(i + 1, services, shop).run()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // ya no puede llegar nadie más
        shop.floor().wait_for_arrivals(arrivals);
        shop.close();

        let mut report = SimulationReport::default();
        for barber in barbers {
            report.barbers.push(barber.join()??);
        }
        for client in clients {
            report.clients.push(client.join()??);
        }
        info!(served = report.served(), rejected = report.rejected(), "barbería vacía");
        Ok(report)
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }
}
