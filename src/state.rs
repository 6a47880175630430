use core::any::Any;
use core::fmt;
use std::collections::HashMap;

use crate::types::{Axis, Heater, Position};

/// The printer as a G-code stream sees it at one point of that stream.
///
/// Coordinates are stored in machine space and are always absolute. Reads return the
/// logical coordinate, that is the machine coordinate minus the offset installed by the
/// last `G92` on that axis. The movement mode flags only decide how *incoming* values
/// are interpreted by the setters.
///
/// State is only meant to be mutated by [`Instruction::apply`](crate::Instruction::apply).
pub struct MachineState {
    machine: [f64; 3],
    offset: [f64; 3],
    machine_e: f64,
    offset_e: f64,
    feed_rate: f64,

    abs_mode: bool,
    abs_extruder_mode: bool,
    extruder_override: bool,

    temperatures: [f64; 3],
    fan_speed: f64,
    homed: [bool; 3],

    extras: HashMap<String, Box<dyn Any + Send>>,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            machine: [0.; 3],
            offset: [0.; 3],
            machine_e: 0.,
            offset_e: 0.,
            feed_rate: 0.,
            abs_mode: true,
            abs_extruder_mode: true,
            extruder_override: false,
            temperatures: [0.; 3],
            fan_speed: 0.,
            homed: [false; 3],
            extras: HashMap::new(),
        }
    }
}

fn heater_index(heater: Heater) -> usize {
    match heater {
        Heater::Hotend => 0,
        Heater::Bed => 1,
        Heater::Chamber => 2,
    }
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        let i = axis.index();
        self.machine[i] - self.offset[i]
    }

    /// Moves `axis` by `value` in relative mode, to `value` in absolute mode.
    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        let i = axis.index();
        if self.abs_mode {
            self.machine[i] = value + self.offset[i];
        } else {
            self.machine[i] += value;
        }
    }

    pub fn x(&self) -> f64 {
        self.axis(Axis::X)
    }

    pub fn y(&self) -> f64 {
        self.axis(Axis::Y)
    }

    pub fn z(&self) -> f64 {
        self.axis(Axis::Z)
    }

    pub fn set_x(&mut self, value: f64) {
        self.set_axis(Axis::X, value)
    }

    pub fn set_y(&mut self, value: f64) {
        self.set_axis(Axis::Y, value)
    }

    pub fn set_z(&mut self, value: f64) {
        self.set_axis(Axis::Z, value)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x(), self.y(), self.z())
    }

    pub fn e(&self) -> f64 {
        self.machine_e - self.offset_e
    }

    /// Feeds filament by `value` in relative extruder mode, to `value` in absolute mode.
    pub fn set_e(&mut self, value: f64) {
        if self.abs_extruder_mode {
            self.machine_e = value + self.offset_e;
        } else {
            self.machine_e += value;
        }
    }

    pub fn f(&self) -> f64 {
        self.feed_rate
    }

    /// Feed rate is always absolute.
    pub fn set_f(&mut self, value: f64) {
        self.feed_rate = value;
    }

    /// Makes the current position of `axis` read as `value` from now on, without moving.
    pub fn define_axis(&mut self, axis: Axis, value: f64) {
        let i = axis.index();
        self.offset[i] = self.machine[i] - value;
    }

    pub fn define_e(&mut self, value: f64) {
        self.offset_e = self.machine_e - value;
    }

    pub fn offset(&self, axis: Axis) -> f64 {
        self.offset[axis.index()]
    }

    pub fn offset_e(&self) -> f64 {
        self.offset_e
    }

    pub fn abs_mode(&self) -> bool {
        self.abs_mode
    }

    /// Also switches the extruder, unless its mode was ever set on its own.
    pub fn set_abs_mode(&mut self, abs: bool) {
        self.abs_mode = abs;
        if !self.extruder_override {
            self.abs_extruder_mode = abs;
        }
    }

    pub fn abs_extruder_mode(&self) -> bool {
        self.abs_extruder_mode
    }

    pub fn set_abs_extruder_mode(&mut self, abs: bool) {
        self.abs_extruder_mode = abs;
        self.extruder_override = true;
    }

    pub fn extruder_override(&self) -> bool {
        self.extruder_override
    }

    /// Where a move with these arguments would end, without making it.
    pub fn position_after(&self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Position {
        let resolve = |axis: Axis, value: Option<f64>| match value {
            None => self.axis(axis),
            Some(v) if self.abs_mode => v,
            Some(v) => self.axis(axis) + v,
        };
        Position::new(resolve(Axis::X, x), resolve(Axis::Y, y), resolve(Axis::Z, z))
    }

    /// Where the filament would be after feeding `e`, without feeding it.
    pub fn e_after(&self, e: Option<f64>) -> f64 {
        match e {
            None => self.e(),
            Some(v) if self.abs_extruder_mode => v,
            Some(v) => self.e() + v,
        }
    }

    pub fn temperature(&self, heater: Heater) -> f64 {
        self.temperatures[heater_index(heater)]
    }

    pub fn set_temperature(&mut self, heater: Heater, value: f64) {
        self.temperatures[heater_index(heater)] = value;
    }

    /// 0 (off) to 255 (full).
    pub fn fan_speed(&self) -> f64 {
        self.fan_speed
    }

    pub fn set_fan_speed(&mut self, value: f64) {
        self.fan_speed = value;
    }

    pub fn is_homed(&self, axis: Axis) -> bool {
        self.homed[axis.index()]
    }

    pub fn set_homed(&mut self, axis: Axis, homed: bool) {
        self.homed[axis.index()] = homed;
    }

    /// Side-table for state owned by extension instructions. Only the `apply` of the
    /// instruction kind that owns a key should write it.
    pub fn extra<T: Any>(&self, key: &str) -> Option<&T> {
        self.extras.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn set_extra<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.extras.insert(key.into(), Box::new(value));
    }

    pub fn remove_extra(&mut self, key: &str) -> bool {
        self.extras.remove(key).is_some()
    }
}

impl fmt::Debug for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extras: Vec<_> = self.extras.keys().collect();
        extras.sort();
        f.debug_struct("MachineState")
            .field("position", &self.position())
            .field("e", &self.e())
            .field("f", &self.feed_rate)
            .field("offset", &self.offset)
            .field("offset_e", &self.offset_e)
            .field("abs_mode", &self.abs_mode)
            .field("abs_extruder_mode", &self.abs_extruder_mode)
            .field("extruder_override", &self.extruder_override)
            .field("temperatures", &self.temperatures)
            .field("fan_speed", &self.fan_speed)
            .field("homed", &self.homed)
            .field("extras", &extras)
            .finish()
    }
}
