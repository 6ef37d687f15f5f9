//! Vida de un barbero: banco -> cliente -> servicios -> despedida -> banco,
//! hasta que la barbería cierra y no queda nadie esperando.

use std::sync::Arc;

use rand::{thread_rng, Rng};
use tracing::{debug, info, warn};

use crate::board::{Role, Snapshot};
use crate::config::spend;
use crate::error::{Result, ShopError};
use crate::line::ServiceMessage;
use crate::pool::StationRecord;
use crate::queue::ServiceRequest;
use crate::service::{Service, ServiceSet, Station, Tool, ToolSet};
use crate::shop::BarberShop;
use crate::tools::PickedTool;
use crate::{BarberId, ClientId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarberState {
    IdleOnBench,
    WaitingForClient,
    WaitingSeat,
    WaitingBasin,
    RequestingScissor,
    RequestingComb,
    RequestingRazor,
    Cutting,
    Shaving,
    Washing,
    Terminated,
}

impl BarberState {
    pub fn label(self) -> &'static str {
        match self {
            BarberState::IdleOnBench => "BENCH    ",
            BarberState::WaitingForClient => "W CLIENT ",
            BarberState::WaitingSeat => "W SEAT   ",
            BarberState::WaitingBasin => "W BASIN  ",
            BarberState::RequestingScissor => "R SCISSOR",
            BarberState::RequestingComb => "R COMB   ",
            BarberState::RequestingRazor => "R RAZOR  ",
            BarberState::Cutting => "CUTTING  ",
            BarberState::Shaving => "SHAVING  ",
            BarberState::Washing => "WASHING  ",
            BarberState::Terminated => "DONE     ",
        }
    }

    fn requesting(tool: Tool) -> Self {
        match tool {
            Tool::Scissor => BarberState::RequestingScissor,
            Tool::Comb => BarberState::RequestingComb,
            Tool::Razor => BarberState::RequestingRazor,
        }
    }

    fn working(service: Service) -> Self {
        match service {
            Service::Haircut => BarberState::Cutting,
            Service::Shave => BarberState::Shaving,
            Service::Wash => BarberState::Washing,
        }
    }

    fn waiting(station: Station) -> Self {
        match station {
            Station::Chair => BarberState::WaitingSeat,
            Station::Basin => BarberState::WaitingBasin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarberReport {
    pub id: BarberId,
    pub served: Vec<ClientId>,
}

pub struct Barber {
    id: BarberId,
    shop: Arc<BarberShop>,
    state: BarberState,
    client: Option<ClientId>,
    // lo que le falta hacer al cliente actual
    services: ServiceSet,
    bench: Option<usize>,
    chair: Option<usize>,
    basin: Option<usize>,
    tools: ToolSet,
    served: Vec<ClientId>,
}

impl Barber {
    pub fn new(id: BarberId, shop: Arc<BarberShop>) -> Self {
        assert!(id > 0, "id de barbero inválido: {id}");
        Barber {
            id,
            shop,
            state: BarberState::IdleOnBench,
            client: None,
            services: ServiceSet::default(),
            bench: None,
            chair: None,
            basin: None,
            tools: ToolSet::EMPTY,
            served: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<BarberReport> {
        // una vez por vuelta: cerrada y sin nadie esperando -> terminar
        while !self.shop.floor().no_more_clients() {
            self.sit_in_bench();
            let Some(request) = self.wait_for_client() else {
                self.rise_from_bench();
                break;
            };
            self.rise_from_bench();
            let attended = self.attend(request);
            // aunque haya fallado: los demás barberos esperan este aviso para irse
            self.shop.floor().client_released();
            match attended {
                Err(ShopError::LineClosed(client)) => self.abandoned_by(client),
                other => other?,
            }
        }
        self.done();
        Ok(BarberReport { id: self.id, served: self.served })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            role: Role::Barber,
            id: self.id,
            state: self.state.label(),
            counterpart: self.client,
            tools: self.tools,
            services: self.services,
            position: self.chair.or(self.basin),
        }
    }

    fn sit_in_bench(&mut self) {
        assert!(self.bench.is_none(), "el barbero {} ya está sentado en el banco", self.id);
        let seat = self.shop.barber_bench().acquire(self.id);
        self.bench = Some(seat);
        self.set_state(BarberState::IdleOnBench);
    }

    fn rise_from_bench(&mut self) {
        let Some(seat) = self.bench.take() else {
            panic!("el barbero {} no estaba sentado en el banco", self.id);
        };
        self.shop.barber_bench().release(seat);
        self.log();
    }

    fn wait_for_client(&mut self) -> Option<ServiceRequest> {
        self.set_state(BarberState::WaitingForClient);
        let request = self.shop.floor().next_client()?;
        self.client = Some(request.client);
        self.services = request.services;
        debug!(barber = self.id, client = request.client, services = %request.services, "cliente asignado");
        Some(request)
    }

    fn attend(&mut self, request: ServiceRequest) -> Result<()> {
        self.greet(request)?;
        self.process_requests(request.client)?;
        self.release_client(request.client)
    }

    fn greet(&mut self, request: ServiceRequest) -> Result<()> {
        self.shop.line().greet(self.id, request.client)?;
        self.log();
        Ok(())
    }

    /// Primero los servicios de silla (corte y afeitado seguidos comparten la
    /// misma silla, que se libera después del último), después el lavado.
    fn process_requests(&mut self, client: ClientId) -> Result<()> {
        let shop = Arc::clone(&self.shop);
        for station in [Station::Chair, Station::Basin] {
            if !self.services.needs(station) {
                continue;
            }
            self.set_state(BarberState::waiting(station));
            let reservation = shop.stations(station).reserve(self.id);
            self.set_position(station, Some(reservation.index()));

            for service in Service::ALL.into_iter().filter(|s| s.station() == station) {
                if self.services.contains(service) {
                    self.serve(&shop, reservation.index(), reservation.record(), client, service)?;
                    self.services.remove(service);
                }
            }

            drop(reservation);
            self.set_position(station, None);
            self.log();
        }
        Ok(())
    }

    /// Herramientas y registro vuelven a cero haya salido bien o no.
    fn serve(
        &mut self,
        shop: &BarberShop,
        position: usize,
        record: &StationRecord,
        client: ClientId,
        service: Service,
    ) -> Result<()> {
        let picked = self.pick_tools(shop, service);
        assert!(
            service.tools().iter().all(|tool| self.tools.contains(*tool)),
            "el barbero {} va a hacer {} sin sus herramientas",
            self.id,
            service
        );

        let served = self.perform(shop, position, record, client, service);

        self.tools = ToolSet::EMPTY;
        record.set_tools(self.tools);
        drop(picked);
        match served {
            Ok(()) => record.vacate(),
            Err(_) => record.clear(),
        }
        self.log();
        served
    }

    fn perform(
        &mut self,
        shop: &BarberShop,
        position: usize,
        record: &StationRecord,
        client: ClientId,
        service: Service,
    ) -> Result<()> {
        record.occupy(self.id, client);
        record.set_tools(self.tools);
        let message = ServiceMessage { barber: self.id, client, station: service.station(), position, service };
        shop.line().inform(message)?;
        // el cliente se sienta
        shop.line().wait_ack(client)?;

        self.set_state(BarberState::working(service));
        self.work(record);

        shop.line().finished(client, service)?;
        // el cliente se levanta
        shop.line().wait_ack(client)
    }

    /// De a una, en el orden que pide el servicio (tijera antes que peine).
    fn pick_tools<'a>(&mut self, shop: &'a BarberShop, service: Service) -> Vec<PickedTool<'a>> {
        service
            .tools()
            .iter()
            .map(|tool| {
                self.set_state(BarberState::requesting(*tool));
                let picked = shop.tools().pick(self.id, *tool);
                self.tools.set(*tool, true);
                picked
            })
            .collect()
    }

    /// Avance gradual de 0 a 100 en pasos de tamaño y duración al azar.
    fn work(&self, record: &StationRecord) {
        let mut rng = thread_rng();
        let steps: u8 = rng.gen_range(5..=20);
        let mut complete: u8 = 0;
        while complete < 100 {
            spend(self.shop.config().work_time());
            complete = complete.saturating_add(rng.gen_range(1..=2 * 100 / steps)).min(100);
            record.set_completion(complete);
        }
    }

    fn release_client(&mut self, client: ClientId) -> Result<()> {
        assert!(self.services.is_empty(), "el barbero {} despide a {} con servicios pendientes", self.id, client);
        self.shop.line().client_done(client)?;
        self.shop.line().wait_departure(client);

        info!(barber = self.id, client, "cliente atendido");
        self.served.push(client);
        self.client = None;
        self.log();
        Ok(())
    }

    /// El cliente abortó a mitad de camino: se lo da por perdido y se sigue.
    fn abandoned_by(&mut self, client: ClientId) {
        warn!(barber = self.id, client, "cliente perdido");
        self.client = None;
        self.services = ServiceSet::default();
        self.chair = None;
        self.basin = None;
        self.log();
    }

    fn done(&mut self) {
        self.set_state(BarberState::Terminated);
        info!(barber = self.id, served = self.served.len(), "barbero se va");
    }

    fn set_position(&mut self, station: Station, position: Option<usize>) {
        match station {
            Station::Chair => self.chair = position,
            Station::Basin => self.basin = position,
        }
    }

    fn set_state(&mut self, state: BarberState) {
        self.state = state;
        debug!(barber = self.id, state = ?state, "transición");
        self.log();
    }

    fn log(&self) {
        self.shop.report(&self.snapshot());
    }
}
