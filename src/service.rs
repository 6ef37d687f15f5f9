//! Servicios que pide un cliente y herramientas que necesita cada uno.

use std::fmt;

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Service {
    Haircut,
    Shave,
    Wash,
}

/// Dónde se presta un servicio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Station {
    Chair,
    Basin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    Scissor = 0,
    Comb,
    Razor,
}

impl Service {
    /// Orden en que el barbero atiende los pedidos: corte y afeitado comparten silla.
    pub const ALL: [Service; 3] = [Service::Haircut, Service::Shave, Service::Wash];

    pub fn station(self) -> Station {
        match self {
            Service::Haircut | Service::Shave => Station::Chair,
            Service::Wash => Station::Basin,
        }
    }

    /// Herramientas en el orden en que se piden al pote.
    pub fn tools(self) -> &'static [Tool] {
        match self {
            Service::Haircut => &[Tool::Scissor, Tool::Comb],
            Service::Shave => &[Tool::Razor],
            Service::Wash => &[],
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Haircut => "corte",
            Service::Shave => "afeitado",
            Service::Wash => "lavado",
        };
        f.write_str(name)
    }
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Scissor, Tool::Comb, Tool::Razor];
}

/// Pedido de un cliente. Solo pierde servicios a medida que se completan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ServiceSet {
    pub haircut: bool,
    pub shave: bool,
    pub wash: bool,
}

impl ServiceSet {
    pub fn of(services: &[Service]) -> Self {
        let mut set = ServiceSet::default();
        for service in services {
            match service {
                Service::Haircut => set.haircut = true,
                Service::Shave => set.shave = true,
                Service::Wash => set.wash = true,
            }
        }
        set
    }

    /// Pedido al azar, nunca vacío.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        loop {
            let set = ServiceSet { haircut: rng.gen(), shave: rng.gen(), wash: rng.gen() };
            if !set.is_empty() {
                return set;
            }
        }
    }

    pub fn contains(&self, service: Service) -> bool {
        match service {
            Service::Haircut => self.haircut,
            Service::Shave => self.shave,
            Service::Wash => self.wash,
        }
    }

    /// Marca el servicio como hecho. Devuelve false si no estaba pendiente.
    pub fn remove(&mut self, service: Service) -> bool {
        let flag = match service {
            Service::Haircut => &mut self.haircut,
            Service::Shave => &mut self.shave,
            Service::Wash => &mut self.wash,
        };
        std::mem::replace(flag, false)
    }

    pub fn is_empty(&self) -> bool {
        !(self.haircut || self.shave || self.wash)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn needs(&self, station: Station) -> bool {
        self.iter().any(|service| service.station() == station)
    }

    pub fn iter(&self) -> impl Iterator<Item = Service> + '_ {
        Service::ALL.into_iter().filter(move |service| self.contains(*service))
    }
}

impl fmt::Display for ServiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(f, "{}{}{}", flag(self.haircut, 'H'), flag(self.shave, 'S'), flag(self.wash, 'W'))
    }
}

/// Herramientas en mano de un barbero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ToolSet {
    pub scissor: bool,
    pub comb: bool,
    pub razor: bool,
}

impl ToolSet {
    pub const EMPTY: ToolSet = ToolSet { scissor: false, comb: false, razor: false };

    pub fn contains(&self, tool: Tool) -> bool {
        match tool {
            Tool::Scissor => self.scissor,
            Tool::Comb => self.comb,
            Tool::Razor => self.razor,
        }
    }

    /// Devuelve el valor anterior del flag.
    pub fn set(&mut self, tool: Tool, held: bool) -> bool {
        let flag = match tool {
            Tool::Scissor => &mut self.scissor,
            Tool::Comb => &mut self.comb,
            Tool::Razor => &mut self.razor,
        };
        std::mem::replace(flag, held)
    }

    pub fn is_empty(&self) -> bool {
        *self == ToolSet::EMPTY
    }

    /// Codificación compacta para guardar en un atómico.
    pub fn bits(&self) -> u8 {
        Tool::ALL
            .iter()
            .filter(|tool| self.contains(**tool))
            .fold(0, |bits, tool| bits | 1 << *tool as u8)
    }

    pub fn from_bits(bits: u8) -> Self {
        let mut set = ToolSet::EMPTY;
        for tool in Tool::ALL {
            set.set(tool, bits & (1 << tool as u8) != 0);
        }
        set
    }
}

impl fmt::Display for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(f, "{}{}{}", flag(self.scissor, 'S'), flag(self.comb, 'C'), flag(self.razor, 'R'))
    }
}
