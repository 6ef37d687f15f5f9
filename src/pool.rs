//! Conjunto acotado de lugares intercambiables (bancos, sillas, lavatorios).
//!
//! Un monitor: el vector de dueños vive en un `Mutex` y quien espera un lugar
//! libre duerme en la `Condvar` hasta que alguien libere uno. El lugar se
//! elige al azar entre los libres, no siempre el primero.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use rand::{thread_rng, Rng};

use crate::service::ToolSet;
use crate::{BarberId, ClientId};

pub struct ResourcePool<T> {
    name: &'static str,
    owners: Mutex<Vec<Option<BarberId>>>,
    freed: Condvar,
    slots: Vec<T>,
}

impl<T: Default> ResourcePool<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        ResourcePool {
            name,
            owners: Mutex::new(vec![None; capacity]),
            freed: Condvar::new(),
            slots: (0..capacity).map(|_| T::default()).collect(),
        }
    }
}

impl<T> ResourcePool<T> {
    /// Bloquea hasta que haya un lugar libre y lo toma a nombre de `owner`.
    pub fn acquire(&self, owner: BarberId) -> usize {
        let owners = self.owners.lock().unwrap();
        if owners.contains(&Some(owner)) {
            drop(owners);
            panic!("[{}] {} ya ocupa un lugar", self.name, owner);
        }

        let mut owners = self
            .freed
            .wait_while(owners, |owners| owners.iter().all(Option::is_some))
            .unwrap();

        let free: Vec<usize> = (0..owners.len()).filter(|i| owners[*i].is_none()).collect();
        let index = free[thread_rng().gen_range(0..free.len())];
        owners[index] = Some(owner);
        index
    }

    /// Como `acquire`, pero el lugar se libera solo al soltar la reserva.
    pub fn reserve(&self, owner: BarberId) -> Reservation<'_, T> {
        let index = self.acquire(owner);
        Reservation { pool: self, index }
    }

    /// Libera el lugar. Liberar un lugar que nadie ocupa es un error de lógica.
    pub fn release(&self, index: usize) {
        let mut owners = self.owners.lock().unwrap();
        let previous = owners.get_mut(index).and_then(Option::take);
        drop(owners);

        if previous.is_none() {
            panic!("[{}] se liberó el lugar {} que no estaba ocupado", self.name, index);
        }
        self.freed.notify_all();
    }

    /// Lugar que ocupa `owner`, si ocupa alguno.
    pub fn position_of(&self, owner: BarberId) -> Option<usize> {
        self.owners.lock().unwrap().iter().position(|slot| *slot == Some(owner))
    }

    pub fn owner(&self, index: usize) -> Option<BarberId> {
        self.owners.lock().unwrap().get(index).copied().flatten()
    }

    pub fn occupant_count(&self) -> usize {
        self.owners.lock().unwrap().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn free_count(&self) -> usize {
        self.capacity() - self.occupant_count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Registro asociado al lugar (se lee sin tomar el lock).
    pub fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Lugar tomado de un `ResourcePool`.
#[must_use = "el lugar se libera apenas se suelta la reserva"]
pub struct Reservation<'a, T> {
    pool: &'a ResourcePool<T>,
    index: usize,
}

impl<'a, T> Reservation<'a, T> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> &'a T {
        self.pool.slot(self.index)
    }
}

impl<T> Drop for Reservation<'_, T> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}

/// Registro de una silla o un lavatorio. Lo escribe solo el barbero que lo
/// ocupa; cualquiera lo puede leer (por ejemplo, el tablero de estado).
#[derive(Debug, Default)]
pub struct StationRecord {
    barber: AtomicUsize,
    client: AtomicUsize,
    tools: AtomicU8,
    completion: AtomicU8,
    seated: AtomicBool,
}

/// Copia de un `StationRecord` en un instante.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StationView {
    pub barber: Option<BarberId>,
    pub client: Option<ClientId>,
    pub tools: ToolSet,
    pub completion: u8,
    pub seated: bool,
}

impl StationRecord {
    /// Empieza un servicio: el porcentaje vuelve a cero y nadie está sentado.
    pub fn occupy(&self, barber: BarberId, client: ClientId) {
        self.barber.store(barber, Ordering::SeqCst);
        self.client.store(client, Ordering::SeqCst);
        self.completion.store(0, Ordering::SeqCst);
        self.seated.store(false, Ordering::SeqCst);
    }

    pub fn set_tools(&self, tools: ToolSet) {
        self.tools.store(tools.bits(), Ordering::SeqCst);
    }

    pub fn set_completion(&self, percent: u8) {
        assert!(percent <= 100, "porcentaje fuera de rango: {percent}");
        let previous = self.completion.load(Ordering::SeqCst);
        assert!(previous <= percent, "el avance retrocedió de {previous} a {percent}");
        self.completion.store(percent, Ordering::SeqCst);
    }

    pub fn completion(&self) -> u8 {
        self.completion.load(Ordering::SeqCst)
    }

    /// El cliente asignado se sienta. Otro cliente sentado es un error de lógica.
    pub fn sit(&self, client: ClientId) {
        let assigned = self.client.load(Ordering::SeqCst);
        assert_eq!(assigned, client, "el cliente {client} se sentó en un lugar asignado a {assigned}");
        let was_seated = self.seated.swap(true, Ordering::SeqCst);
        assert!(!was_seated, "el cliente {client} se sentó en un lugar ocupado");
    }

    pub fn rise(&self, client: ClientId) {
        let was_seated = self.seated.swap(false, Ordering::SeqCst);
        assert!(was_seated, "el cliente {client} se levantó de un lugar vacío");
    }

    /// Termina el servicio. El cliente ya tiene que haberse levantado.
    pub fn vacate(&self) {
        assert!(!self.seated.load(Ordering::SeqCst), "se liberó un lugar con el cliente sentado");
        self.clear();
    }

    /// Vuelve a cero sin preguntar: el servicio se cortó a la mitad.
    pub fn clear(&self) {
        self.barber.store(0, Ordering::SeqCst);
        self.client.store(0, Ordering::SeqCst);
        self.tools.store(0, Ordering::SeqCst);
        self.completion.store(0, Ordering::SeqCst);
        self.seated.store(false, Ordering::SeqCst);
    }

    pub fn view(&self) -> StationView {
        let id = |value: usize| (value != 0).then_some(value);
        StationView {
            barber: id(self.barber.load(Ordering::SeqCst)),
            client: id(self.client.load(Ordering::SeqCst)),
            tools: ToolSet::from_bits(self.tools.load(Ordering::SeqCst)),
            completion: self.completion.load(Ordering::SeqCst),
            seated: self.seated.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn occupants_never_exceed_capacity() {
        let pool = Arc::new(ResourcePool::<()>::new("sillas", 2));
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (1..=8)
            .map(|owner| {
                let (pool, inside, peak) = (pool.clone(), inside.clone(), peak.clone());
                thread::spawn(move || {
                    for _ in 0..20 {
                        let index = pool.acquire(owner);
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        assert!(pool.occupant_count() <= pool.capacity());
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                        pool.release(index);
                    }
                })
            })
            .collect();
        handles.into_iter().for_each(|h| h.join().unwrap());

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn acquire_blocks_until_release() {
        let pool = Arc::new(ResourcePool::<()>::new("banco", 1));
        let first = pool.acquire(1);

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire(2))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        pool.release(first);
        assert_eq!(waiter.join().unwrap(), 0);
        assert_eq!(pool.owner(0), Some(2));
    }

    #[test]
    fn free_slot_is_chosen_at_random() {
        let pool = ResourcePool::<()>::new("banco", 4);
        let chosen: HashSet<usize> = (0..200)
            .map(|_| {
                let index = pool.acquire(7);
                pool.release(index);
                index
            })
            .collect();
        assert!(chosen.len() > 1);
    }

    #[test]
    fn acquire_then_release_leaves_counts_unchanged() {
        let pool = ResourcePool::<()>::new("lavatorios", 3);
        let taken = pool.acquire(1);
        let before = (pool.occupant_count(), pool.free_count());

        let index = pool.acquire(2);
        pool.release(index);

        assert_eq!((pool.occupant_count(), pool.free_count()), before);
        assert_eq!(pool.position_of(1), Some(taken));
        assert_eq!(pool.position_of(2), None);
    }

    #[test]
    fn releasing_a_free_slot_is_fatal_and_changes_nothing() {
        let pool = ResourcePool::<()>::new("sillas", 2);
        let taken = pool.acquire(1);
        let free = 1 - taken;

        let result = catch_unwind(AssertUnwindSafe(|| pool.release(free)));
        assert!(result.is_err());
        assert_eq!(pool.occupant_count(), 1);
        assert_eq!(pool.free_count(), 1);
        // el lock no quedó envenenado
        pool.release(taken);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn owner_cannot_hold_two_slots() {
        let pool = ResourcePool::<()>::new("banco", 2);
        pool.acquire(1);
        let result = catch_unwind(AssertUnwindSafe(|| pool.acquire(1)));
        assert!(result.is_err());
        assert_eq!(pool.occupant_count(), 1);
    }

    #[test]
    fn reservation_releases_on_drop() {
        let pool = ResourcePool::<StationRecord>::new("sillas", 1);
        {
            let chair = pool.reserve(4);
            assert_eq!(pool.owner(chair.index()), Some(4));
            chair.record().occupy(4, 1);
            assert_eq!(pool.free_count(), 0);
        }
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.slot(0).view().barber, Some(4));
    }

    #[test]
    fn station_completion_is_monotonic_per_service() {
        let station = StationRecord::default();
        station.occupy(1, 5);
        station.set_completion(40);
        station.set_completion(100);
        assert!(catch_unwind(AssertUnwindSafe(|| station.set_completion(30))).is_err());

        station.occupy(1, 5);
        assert_eq!(station.completion(), 0);
    }

    #[test]
    fn station_tracks_the_seated_client() {
        let station = StationRecord::default();
        station.occupy(2, 9);
        station.set_tools(ToolSet { razor: true, ..ToolSet::EMPTY });
        station.sit(9);

        let view = station.view();
        assert_eq!(view.barber, Some(2));
        assert_eq!(view.client, Some(9));
        assert!(view.seated && view.tools.razor);

        assert!(catch_unwind(AssertUnwindSafe(|| station.sit(9))).is_err());
        station.rise(9);
        station.vacate();
        assert_eq!(station.view().client, None);
    }

    #[test]
    fn interrupted_service_leaves_the_station_usable() {
        let station = StationRecord::default();
        station.occupy(2, 9);
        station.set_tools(ToolSet { razor: true, ..ToolSet::EMPTY });
        station.sit(9);
        station.set_completion(60);

        station.clear();
        let view = station.view();
        assert_eq!((view.barber, view.client, view.completion), (None, None, 0));
        assert!(!view.seated && view.tools.is_empty());

        station.occupy(1, 4);
        station.sit(4);
        assert!(station.view().seated);
    }

    #[test]
    fn new_service_starts_with_nobody_seated() {
        let station = StationRecord::default();
        station.occupy(2, 9);
        station.sit(9);
        station.occupy(3, 4);
        station.sit(4);
        assert_eq!(station.view().client, Some(4));
    }
}
