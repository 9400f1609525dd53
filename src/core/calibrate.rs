use crate::types::{CalibrationType, Noaa1bError, Noaa1bResult};
use ndarray::{Array2, Zip};

/// First radiation constant (mW/(m^2 sr cm^-4))
pub const C1: f64 = 1.1910427e-5;

/// Second radiation constant (cm K)
pub const C2: f64 = 1.4387752;

/// Offset between kelvin and degrees Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Per-channel quadratic count calibration from a data record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountCoefficients {
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl CountCoefficients {
    pub fn new(a0: f64, a1: f64, a2: f64) -> Self {
        Self { a0, a1, a2 }
    }

    /// Coefficients for a channel that failed its quality check
    pub fn invalid() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn is_valid(&self) -> bool {
        !(self.a0.is_nan() || self.a1.is_nan() || self.a2.is_nan())
    }

    /// Radiance (or scaled albedo) for a raw count
    pub fn apply(&self, count: f64) -> f64 {
        self.a0 + self.a1 * count + self.a2 * count * count
    }
}

/// Header-level radiance to temperature constants for a thermal channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureConstants {
    /// Central wavenumber (cm^-1)
    pub wavenumber: f64,
    pub b: f64,
    pub c: f64,
}

impl TemperatureConstants {
    pub fn new(wavenumber: f64, b: f64, c: f64) -> Self {
        Self { wavenumber, b, c }
    }

    /// Invert the Planck function: T* = c2 v / ln(1 + c1 v^3 / rad),
    /// then T = (T* - b) / c.
    pub fn temperature(&self, radiance: f64, celsius: bool) -> f64 {
        let v = self.wavenumber;
        let b = if celsius {
            self.b + KELVIN_OFFSET * self.c
        } else {
            self.b
        };
        let tstar = (C2 * v) / (1.0 + (C1 * v * v * v) / radiance).ln();
        (tstar - b) / self.c
    }

    /// Forward Planck function for a brightness temperature in kelvin
    pub fn radiance(&self, kelvin: f64) -> f64 {
        let v = self.wavenumber;
        let tstar = self.b + self.c * kelvin;
        (C1 * v * v * v) / ((C2 * v / tstar).exp() - 1.0)
    }
}

/// Calibrates raw counts for one channel of one scan line
#[derive(Debug, Clone)]
pub struct ChannelCalibrator {
    coefficients: CountCoefficients,
    constants: Option<TemperatureConstants>,
    calibration_type: CalibrationType,
}

impl ChannelCalibrator {
    /// Create a calibrator, rejecting calibration types that do not
    /// match the channel class.
    pub fn new(
        channel: usize,
        thermal: bool,
        coefficients: CountCoefficients,
        constants: Option<TemperatureConstants>,
        calibration_type: CalibrationType,
    ) -> Noaa1bResult<Self> {
        let class = if thermal { "thermal" } else { "visible" };
        if thermal != calibration_type.is_thermal() {
            return Err(Noaa1bError::InvalidArgument(format!(
                "Invalid calibration type {} for {} channel {}",
                calibration_type, class, channel
            )));
        }

        let needs_constants = matches!(
            calibration_type,
            CalibrationType::Kelvin | CalibrationType::Celsius
        );
        if needs_constants && constants.is_none() {
            return Err(Noaa1bError::InvalidArgument(format!(
                "No temperature constants for {} channel {}",
                class, channel
            )));
        }

        Ok(Self {
            coefficients,
            constants,
            calibration_type,
        })
    }

    pub fn calibration_type(&self) -> CalibrationType {
        self.calibration_type
    }

    /// Calibrate a single count
    pub fn calibrate(&self, count: i32) -> f64 {
        let count = count as f64;
        match (self.calibration_type, self.constants) {
            (CalibrationType::Radiance, _) => self.coefficients.apply(count),
            (CalibrationType::Albedo, _) => self.coefficients.apply(count),
            (CalibrationType::Reflectance, _) => 0.01 * self.coefficients.apply(count),
            (CalibrationType::Kelvin, Some(k)) => k.temperature(self.coefficients.apply(count), false),
            (CalibrationType::Celsius, Some(k)) => k.temperature(self.coefficients.apply(count), true),
            // Rejected in new()
            _ => f64::NAN,
        }
    }

    /// Calibrate one scan line of counts
    pub fn calibrate_counts(&self, counts: &[i32]) -> Vec<f64> {
        counts.iter().map(|&c| self.calibrate(c)).collect()
    }

    /// Calibrate a whole count array
    pub fn calibrate_array(&self, counts: &Array2<i32>) -> Array2<f64> {
        log::debug!(
            "Calibrating {}x{} counts to {}",
            counts.nrows(),
            counts.ncols(),
            self.calibration_type
        );

        #[cfg(feature = "parallel")]
        {
            Zip::from(counts).par_map_collect(|&c| self.calibrate(c))
        }
        #[cfg(not(feature = "parallel"))]
        {
            Zip::from(counts).map_collect(|&c| self.calibrate(c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // AMSU-A channel 3 style constants
    fn constants() -> TemperatureConstants {
        TemperatureConstants::new(1.696_9, 0.0, 1.0)
    }

    #[test]
    fn test_planck_inverse_matches_forward() {
        let k = TemperatureConstants::new(2_665.0, 1.5, 0.998);
        for &t in &[200.0, 250.0, 288.15, 310.0] {
            let rad = k.radiance(t);
            assert_relative_eq!(k.temperature(rad, false), t, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_celsius_offset() {
        let k = constants();
        let rad = k.radiance(300.0);
        assert_relative_eq!(k.temperature(rad, true), 300.0 - KELVIN_OFFSET, max_relative = 1e-9);
    }

    #[test]
    fn test_calibration_class_mismatch() {
        let coeffs = CountCoefficients::new(0.0, 1.0, 0.0);
        let err = ChannelCalibrator::new(3, true, coeffs, Some(constants()), CalibrationType::Albedo);
        assert!(matches!(err, Err(Noaa1bError::InvalidArgument(_))));
        let err = ChannelCalibrator::new(20, false, coeffs, None, CalibrationType::Kelvin);
        assert!(matches!(err, Err(Noaa1bError::InvalidArgument(_))));
        let err = ChannelCalibrator::new(3, true, coeffs, None, CalibrationType::Celsius);
        assert!(matches!(err, Err(Noaa1bError::InvalidArgument(_))));
        assert!(ChannelCalibrator::new(3, true, coeffs, None, CalibrationType::Radiance).is_ok());
    }

    #[test]
    fn test_visible_scaling() {
        let coeffs = CountCoefficients::new(-2.0, 0.05, 0.0);
        let albedo = ChannelCalibrator::new(20, false, coeffs, None, CalibrationType::Albedo).unwrap();
        let refl = ChannelCalibrator::new(20, false, coeffs, None, CalibrationType::Reflectance).unwrap();
        assert_relative_eq!(albedo.calibrate(1000), 48.0);
        assert_relative_eq!(refl.calibrate(1000), 0.48);
    }

    #[test]
    fn test_nan_propagates() {
        let cal = ChannelCalibrator::new(
            1,
            true,
            CountCoefficients::invalid(),
            Some(constants()),
            CalibrationType::Celsius,
        )
        .unwrap();
        assert!(cal.calibrate_counts(&[0, 100, 65535]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_line_calibration_keeps_sample_order() {
        let coeffs = CountCoefficients::new(0.5, 1e-3, 0.0);
        let cal = ChannelCalibrator::new(1, true, coeffs, Some(constants()), CalibrationType::Kelvin)
            .unwrap();
        let counts: Vec<i32> = (0..90).map(|i| 9_000 + i * 37).collect();
        let line = cal.calibrate_counts(&counts);
        assert_eq!(line.len(), counts.len());
        for (value, &count) in line.iter().zip(&counts) {
            assert_eq!(*value, cal.calibrate(count));
        }
        assert!(line.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_array_calibration() {
        let coeffs = CountCoefficients::new(1.0, 2.0, 0.5);
        let cal = ChannelCalibrator::new(1, true, coeffs, None, CalibrationType::Radiance).unwrap();
        let counts = Array2::from_shape_vec((2, 2), vec![0, 1, 2, 3]).unwrap();
        let out = cal.calibrate_array(&counts);
        assert_eq!(out.dim(), (2, 2));
        assert_relative_eq!(out[[1, 1]], 1.0 + 6.0 + 4.5);
    }
}
