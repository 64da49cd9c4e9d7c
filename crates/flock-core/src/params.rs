//! Flocking parameters for runtime tuning

/// Tunable state read by the update stage every step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSet {
    // Neighborhood radii
    pub separation_radius: f32,
    pub cohesion_radius: f32,
    pub align_radius: f32,

    // Rule strengths
    pub separation_strength: f32,
    pub cohesion_strength: f32,
    pub align_strength: f32,

    // Integration
    pub time_step: f32,
    /// Max speed scale
    pub boid_speed: f32,

    // Visuals
    /// Neighbor distance at which the color starts to shift
    pub color_radius: f32,
    /// Rendered point size in pixels
    pub point_size: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            separation_radius: 3.0,
            cohesion_radius: 322.0,
            align_radius: 250.0,
            separation_strength: 0.24,
            cohesion_strength: 0.08,
            align_strength: 0.30,
            time_step: 1.0,
            boid_speed: 1.0,
            color_radius: 2.8,
            point_size: 1.0,
        }
    }
}

impl ParameterSet {
    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parameters that leave every particle on its current trajectory:
    /// no rule forcing and no integration.
    pub fn frozen() -> Self {
        Self {
            separation_strength: 0.0,
            cohesion_strength: 0.0,
            align_strength: 0.0,
            time_step: 0.0,
            ..Self::default()
        }
    }

    /// Mutable access to a field by its panel key
    pub fn field_mut(&mut self, field: ParamField) -> &mut f32 {
        match field {
            ParamField::SeparationRadius => &mut self.separation_radius,
            ParamField::CohesionRadius => &mut self.cohesion_radius,
            ParamField::AlignRadius => &mut self.align_radius,
            ParamField::SeparationStrength => &mut self.separation_strength,
            ParamField::CohesionStrength => &mut self.cohesion_strength,
            ParamField::AlignStrength => &mut self.align_strength,
            ParamField::TimeStep => &mut self.time_step,
            ParamField::BoidSpeed => &mut self.boid_speed,
            ParamField::ColorRadius => &mut self.color_radius,
            ParamField::PointSize => &mut self.point_size,
        }
    }

    pub fn field(&self, field: ParamField) -> f32 {
        match field {
            ParamField::SeparationRadius => self.separation_radius,
            ParamField::CohesionRadius => self.cohesion_radius,
            ParamField::AlignRadius => self.align_radius,
            ParamField::SeparationStrength => self.separation_strength,
            ParamField::CohesionStrength => self.cohesion_strength,
            ParamField::AlignStrength => self.align_strength,
            ParamField::TimeStep => self.time_step,
            ParamField::BoidSpeed => self.boid_speed,
            ParamField::ColorRadius => self.color_radius,
            ParamField::PointSize => self.point_size,
        }
    }
}

/// Keys for the individual scalars in a [`ParameterSet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamField {
    SeparationRadius,
    CohesionRadius,
    AlignRadius,
    SeparationStrength,
    CohesionStrength,
    AlignStrength,
    TimeStep,
    BoidSpeed,
    ColorRadius,
    PointSize,
}

/// Display metadata for one panel slider
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub field: ParamField,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    /// Draw a separator before this entry
    pub separated: bool,
}

const fn range(
    field: ParamField,
    label: &'static str,
    min: f32,
    max: f32,
    step: f32,
    separated: bool,
) -> ParamRange {
    ParamRange {
        field,
        label,
        min,
        max,
        step,
        separated,
    }
}

/// Slider table, in panel order
pub const PARAM_RANGES: [ParamRange; 10] = [
    range(ParamField::SeparationRadius, "Separation Radius", 0.1, 2000.0, 0.1, false),
    range(ParamField::CohesionRadius, "Cohesion Radius", 0.1, 2000.0, 0.1, false),
    range(ParamField::AlignRadius, "Align Radius", 0.1, 2000.0, 0.1, false),
    range(ParamField::SeparationStrength, "Separation Strength", 0.01, 5.0, 0.01, true),
    range(ParamField::CohesionStrength, "Cohesion Strength", 0.01, 5.0, 0.01, false),
    range(ParamField::AlignStrength, "Align Strength", 0.01, 5.0, 0.01, false),
    range(ParamField::TimeStep, "Time Step", 0.01, 1.0, 0.05, true),
    range(ParamField::BoidSpeed, "Boid Max Speed", 0.01, 10.0, 0.05, false),
    range(ParamField::ColorRadius, "Color Radius", 0.01, 10.0, 0.01, false),
    range(ParamField::PointSize, "Boid Size", 1.0, 5.0, 0.1, false),
];

/// Run/pause state of the update stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// Steps are no-ops
    #[default]
    Idle,
    /// Every frame dispatches one step
    Stepping,
}

impl RunState {
    pub fn toggle(&mut self) {
        *self = match self {
            RunState::Idle => RunState::Stepping,
            RunState::Stepping => RunState::Idle,
        };
    }

    pub fn is_stepping(self) -> bool {
        self == RunState::Stepping
    }

    pub fn from_stepping(stepping: bool) -> Self {
        if stepping {
            RunState::Stepping
        } else {
            RunState::Idle
        }
    }
}
