//! Línea de comunicación entre un barbero y el cliente que atiende.
//!
//! Cada cliente que entra abre su línea: un canal por donde el barbero le
//! avisa (saludo, servicio asignado, servicio terminado, fin) y un semáforo
//! por donde el cliente confirma que se sentó o se levantó. Cuando el cliente
//! se va cierra la línea y despierta al barbero que espera su partida.
//!
//! Si el cliente aborta, su línea se corta: el barbero deja de esperarlo y
//! recibe `LineClosed` en lugar de quedarse dormido.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};

use std_semaphore::Semaphore;
use tracing::warn;

use crate::error::{Result, ShopError};
use crate::service::{Service, Station};
use crate::{BarberId, ClientId};

/// Asignación de un servicio: quién, a quién, dónde y qué.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceMessage {
    pub barber: BarberId,
    pub client: ClientId,
    pub station: Station,
    pub position: usize,
    pub service: Service,
}

/// Avisos del barbero al cliente.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    Greeted { barber: BarberId },
    Assigned(ServiceMessage),
    Finished(Service),
    AllDone,
}

/// Confirmaciones del cliente. `aborted` se marca antes del último `release`,
/// así quien despierta sabe si fue una confirmación o un abandono.
struct Acks {
    given: Semaphore,
    aborted: AtomicBool,
}

struct Endpoint {
    notices: Sender<Notice>,
    acks: Arc<Acks>,
}

/// Extremo que se queda el cliente.
pub struct ClientLine<'a> {
    line: &'a CommunicationLine,
    client: ClientId,
    notices: Receiver<Notice>,
    acks: Arc<Acks>,
}

impl ClientLine<'_> {
    /// Espera el próximo aviso del barbero.
    pub fn receive(&self) -> Result<Notice> {
        self.notices.recv().map_err(|_| ShopError::LineClosed(self.client))
    }

    /// "Ya me senté" / "ya me levanté"
    pub fn acknowledge(&self) {
        self.acks.given.release();
    }
}

impl Drop for ClientLine<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.line.abort(self.client, &self.acks);
        }
    }
}

#[derive(Default)]
pub struct CommunicationLine {
    lines: Mutex<HashMap<ClientId, Endpoint>>,
    client_left: Condvar,
}

impl CommunicationLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// El cliente entra a la barbería.
    pub fn open(&self, client: ClientId) -> ClientLine<'_> {
        let (sender, receiver) = mpsc::channel();
        let acks = Arc::new(Acks { given: Semaphore::new(0), aborted: AtomicBool::new(false) });

        let mut lines = self.lines.lock().unwrap();
        if lines.contains_key(&client) {
            drop(lines);
            panic!("el cliente {client} ya está adentro");
        }
        lines.insert(client, Endpoint { notices: sender, acks: acks.clone() });

        ClientLine { line: self, client, notices: receiver, acks }
    }

    /// El cliente abortó: se corta su línea y se despierta a su barbero,
    /// esté esperando una confirmación o su partida. Corre durante el
    /// desenrollado, así que no puede volver a entrar en pánico.
    fn abort(&self, client: ClientId, acks: &Acks) {
        let removed = match self.lines.lock() {
            Ok(mut lines) => lines.remove(&client),
            Err(poisoned) => poisoned.into_inner().remove(&client),
        };
        drop(removed);
        acks.aborted.store(true, Ordering::SeqCst);
        acks.given.release();
        self.client_left.notify_all();
        warn!(client, "el cliente abandonó la barbería");
    }

    /// El cliente se va: el barbero que lo atendió queda libre.
    pub fn close(&self, client: ClientId) {
        let removed = self.lines.lock().unwrap().remove(&client);
        if removed.is_none() {
            panic!("el cliente {client} se fue sin haber entrado");
        }
        self.client_left.notify_all();
    }

    pub fn is_inside(&self, client: ClientId) -> bool {
        self.lines.lock().unwrap().contains_key(&client)
    }

    pub fn greet(&self, barber: BarberId, client: ClientId) -> Result<()> {
        self.send(client, Notice::Greeted { barber })
    }

    pub fn inform(&self, service: ServiceMessage) -> Result<()> {
        self.send(service.client, Notice::Assigned(service))
    }

    pub fn finished(&self, client: ClientId, service: Service) -> Result<()> {
        self.send(client, Notice::Finished(service))
    }

    pub fn client_done(&self, client: ClientId) -> Result<()> {
        self.send(client, Notice::AllDone)
    }

    /// Espera la confirmación del cliente (que se sentó o que se levantó).
    /// `LineClosed` si el cliente abortó en lugar de confirmar.
    pub fn wait_ack(&self, client: ClientId) -> Result<()> {
        // el semáforo se saca del mapa: no se bloquea con el lock tomado
        let acks = self
            .lines
            .lock()
            .unwrap()
            .get(&client)
            .map(|endpoint| endpoint.acks.clone())
            .ok_or(ShopError::LineClosed(client))?;
        acks.given.acquire();
        if acks.aborted.load(Ordering::SeqCst) {
            return Err(ShopError::LineClosed(client));
        }
        Ok(())
    }

    /// Bloquea hasta que el cliente cierre su línea.
    pub fn wait_departure(&self, client: ClientId) {
        let _lines = self
            .client_left
            .wait_while(self.lines.lock().unwrap(), |lines| lines.contains_key(&client))
            .unwrap();
    }

    fn send(&self, client: ClientId, notice: Notice) -> Result<()> {
        let sender = self
            .lines
            .lock()
            .unwrap()
            .get(&client)
            .map(|endpoint| endpoint.notices.clone())
            .ok_or(ShopError::LineClosed(client))?;
        sender.send(notice).map_err(|_| ShopError::LineClosed(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn notices_arrive_in_order() {
        let line = CommunicationLine::new();
        let client = line.open(3);

        line.greet(1, 3).unwrap();
        let message = ServiceMessage {
            barber: 1,
            client: 3,
            station: Station::Basin,
            position: 0,
            service: Service::Wash,
        };
        line.inform(message).unwrap();
        line.finished(3, Service::Wash).unwrap();
        line.client_done(3).unwrap();

        assert_eq!(client.receive().unwrap(), Notice::Greeted { barber: 1 });
        assert_eq!(client.receive().unwrap(), Notice::Assigned(message));
        assert_eq!(client.receive().unwrap(), Notice::Finished(Service::Wash));
        assert_eq!(client.receive().unwrap(), Notice::AllDone);
    }

    #[test]
    fn barber_waits_until_the_client_leaves() {
        let line = Arc::new(CommunicationLine::new());
        let _client = line.open(5);

        let barber = {
            let line = line.clone();
            thread::spawn(move || line.wait_departure(5))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!barber.is_finished());

        line.close(5);
        barber.join().unwrap();
        assert!(!line.is_inside(5));
    }

    #[test]
    fn ack_unblocks_the_barber() {
        let line = Arc::new(CommunicationLine::new());
        let client = line.open(2);

        let barber = {
            let line = line.clone();
            thread::spawn(move || line.wait_ack(2))
        };
        thread::sleep(Duration::from_millis(20));
        client.acknowledge();
        barber.join().unwrap().unwrap();
    }

    #[test]
    fn aborted_client_wakes_its_barber() {
        let line = Arc::new(CommunicationLine::new());
        let (opened, is_open) = mpsc::channel();

        let client = {
            let line = line.clone();
            thread::spawn(move || {
                let _client = line.open(4);
                opened.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                panic!("el cliente se desmaya");
            })
        };
        is_open.recv().unwrap();

        let waiting_ack = {
            let line = line.clone();
            thread::spawn(move || line.wait_ack(4))
        };
        let waiting_departure = {
            let line = line.clone();
            thread::spawn(move || line.wait_departure(4))
        };

        assert!(client.join().is_err());
        assert!(matches!(waiting_ack.join().unwrap(), Err(ShopError::LineClosed(4))));
        waiting_departure.join().unwrap();
        assert!(!line.is_inside(4));
        assert!(matches!(line.finished(4, Service::Shave), Err(ShopError::LineClosed(4))));
    }

    #[test]
    fn leaving_normally_does_not_abort() {
        let line = CommunicationLine::new();
        let client = line.open(6);
        client.acknowledge();
        line.wait_ack(6).unwrap();
        drop(client);
        assert!(line.is_inside(6));
        line.close(6);
    }

    #[test]
    fn sending_to_a_client_outside_fails() {
        let line = CommunicationLine::new();
        assert!(matches!(line.greet(1, 8), Err(ShopError::LineClosed(8))));
        assert!(matches!(line.wait_ack(8), Err(ShopError::LineClosed(8))));
    }
}
