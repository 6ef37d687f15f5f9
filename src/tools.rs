//! Pote de herramientas: tijeras, peines y navajas.
//!
//! Tres contadores independientes protegidos por el mismo lock (como la mesa
//! de los fumadores). Además de cuántas quedan, el pote anota quién tiene
//! cada herramienta, así devolver algo que no se tiene falla en el acto.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

use crate::service::{Tool, ToolSet};
use crate::BarberId;

struct Inventory {
    available: [usize; 3],
    held: HashMap<BarberId, ToolSet>,
}

pub struct ToolsPot {
    total: [usize; 3],
    inventory: Mutex<Inventory>,
    returned: Condvar,
}

/// Herramienta en mano. Vuelve al pote al soltarla (también si el servicio falla).
#[must_use = "la herramienta vuelve al pote apenas se suelta"]
pub struct PickedTool<'a> {
    pot: &'a ToolsPot,
    holder: BarberId,
    tool: Tool,
}

impl Drop for PickedTool<'_> {
    fn drop(&mut self) {
        self.pot.put_back(self.holder, self.tool);
    }
}

impl ToolsPot {
    pub fn new(scissors: usize, combs: usize, razors: usize) -> Self {
        let total = [scissors, combs, razors];
        ToolsPot {
            total,
            inventory: Mutex::new(Inventory { available: total, held: HashMap::new() }),
            returned: Condvar::new(),
        }
    }

    /// Bloquea hasta que haya una herramienta del tipo pedido y la toma.
    pub fn pick(&self, holder: BarberId, tool: Tool) -> PickedTool<'_> {
        let inventory = self.inventory.lock().unwrap();
        if inventory.held.get(&holder).is_some_and(|held| held.contains(tool)) {
            drop(inventory);
            panic!("el barbero {holder} ya tiene {tool:?}");
        }

        let mut inventory = self
            .returned
            .wait_while(inventory, |inventory| inventory.available[tool as usize] == 0)
            .unwrap();
        inventory.available[tool as usize] -= 1;
        inventory.held.entry(holder).or_default().set(tool, true);

        PickedTool { pot: self, holder, tool }
    }

    /// Devuelve la herramienta. Devolver algo que no se tiene es una violación del invariante.
    pub fn put_back(&self, holder: BarberId, tool: Tool) {
        let mut inventory = self.inventory.lock().unwrap();
        let had = inventory.held.get_mut(&holder).is_some_and(|held| held.set(tool, false));
        if !had || inventory.available[tool as usize] >= self.total[tool as usize] {
            drop(inventory);
            panic!("el barbero {holder} devolvió {tool:?} sin tenerlo (¿dos veces?)");
        }

        inventory.available[tool as usize] += 1;
        if inventory.held.get(&holder).is_some_and(ToolSet::is_empty) {
            inventory.held.remove(&holder);
        }
        drop(inventory);
        self.returned.notify_all();
    }

    pub fn available(&self, tool: Tool) -> usize {
        self.inventory.lock().unwrap().available[tool as usize]
    }

    pub fn total(&self, tool: Tool) -> usize {
        self.total[tool as usize]
    }

    /// Lo que el pote tiene anotado a nombre de `holder`.
    pub fn held_by(&self, holder: BarberId) -> ToolSet {
        self.inventory.lock().unwrap().held.get(&holder).copied().unwrap_or_default()
    }

    /// Cuántas de cada tipo hay afuera, según lo anotado por barbero.
    pub fn checked_out(&self, tool: Tool) -> usize {
        let inventory = self.inventory.lock().unwrap();
        inventory.held.values().filter(|held| held.contains(tool)).count()
    }

    /// disponibles + en mano == total, para cada tipo (una sola lectura consistente)
    pub fn is_balanced(&self) -> bool {
        let inventory = self.inventory.lock().unwrap();
        Tool::ALL.iter().all(|tool| {
            let out = inventory.held.values().filter(|held| held.contains(*tool)).count();
            inventory.available[*tool as usize] + out == self.total[*tool as usize]
        })
    }
}
