use super::Effect;

/// Drive-based soft saturation for the output chain
///
/// tanh waveshaper with makeup gain. `drive` runs 0.0 (clean) to 1.0
/// (heavily driven); at 0.0 the stage is an exact pass-through.
pub struct Saturation {
    pub drive: f32,
}

impl Saturation {
    pub fn new(drive: f32) -> Self {
        Self {
            drive: drive.clamp(0.0, 1.0),
        }
    }
}

impl Effect for Saturation {
    fn process(&self, input: f32) -> f32 {
        if self.drive <= 0.0 {
            return input;
        }
        // Scale drive from 1.0 to 10.0 and compensate the level increase.
        let drive = 1.0 + self.drive * 9.0;
        let gain = 1.0 / drive.sqrt();
        (input * drive).tanh() * gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drive_is_a_pass_through() {
        let sat = Saturation::new(0.0);
        assert_eq!(sat.process(0.3), 0.3);
        assert_eq!(sat.process(-0.9), -0.9);
    }

    #[test]
    fn saturation_is_symmetric() {
        let sat = Saturation::new(0.6);
        let pos = sat.process(0.7);
        let neg = sat.process(-0.7);
        assert!((pos + neg).abs() < 1e-6);
    }

    #[test]
    fn drive_compresses_peaks() {
        let sat = Saturation::new(1.0);
        let out = sat.process(1.0);
        assert!(out < 1.0 && out > 0.0);
    }
}
