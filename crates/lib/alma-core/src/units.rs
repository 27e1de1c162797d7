//! Unit and coordinate conversions.
//!
//! Pure functions only; range validation is the caller's job.

pub const ARCMIN_PER_DEGREE: f64 = 60.0;
pub const ARCSEC_PER_DEGREE: f64 = 3600.0;
pub const HZ_PER_GHZ: f64 = 1e9;
pub const MJY_PER_JY: f64 = 1000.0;
pub const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

#[must_use]
pub const fn arcmin_to_degrees(arcmin: f64) -> f64 {
    arcmin / ARCMIN_PER_DEGREE
}

#[must_use]
pub const fn arcsec_to_degrees(arcsec: f64) -> f64 {
    arcsec / ARCSEC_PER_DEGREE
}

#[must_use]
pub const fn degrees_to_arcsec(degrees: f64) -> f64 {
    degrees * ARCSEC_PER_DEGREE
}

#[must_use]
pub const fn ghz_to_hz(ghz: f64) -> f64 {
    ghz * HZ_PER_GHZ
}

#[must_use]
pub const fn hz_to_ghz(hz: f64) -> f64 {
    hz / HZ_PER_GHZ
}

#[must_use]
pub const fn jy_to_mjy(jy: f64) -> f64 {
    jy * MJY_PER_JY
}

/// Converts a wavelength in metres to a frequency in gigahertz.
#[must_use]
pub const fn wavelength_m_to_ghz(wavelength_m: f64) -> f64 {
    hz_to_ghz(SPEED_OF_LIGHT_M_PER_S / wavelength_m)
}

/// Observed frequency of a line emitted at `rest_ghz` by a source at redshift `z`.
#[must_use]
pub const fn observed_frequency(rest_ghz: f64, redshift: f64) -> f64 {
    rest_ghz / (1.0 + redshift)
}

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arcmin_conversion_divides_by_sixty_and_is_monotonic() {
        let radii = [0.1, 0.5, 1.0, 2.5, 30.0, 120.0];
        let mut previous = 0.0;
        for radius in radii {
            let degrees = arcmin_to_degrees(radius);
            assert!((degrees - radius / 60.0).abs() < f64::EPSILON);
            assert!(degrees > previous);
            previous = degrees;
        }
    }

    #[test]
    fn arcsec_and_frequency_round_trip() {
        assert!((degrees_to_arcsec(arcsec_to_degrees(0.25)) - 0.25).abs() < 1e-12);
        assert!((hz_to_ghz(ghz_to_hz(230.538)) - 230.538).abs() < 1e-9);
    }

    #[test]
    fn redshifted_co_line_lands_in_band_three() {
        let observed = round_to(observed_frequency(230.538, 1.0), 4);
        assert!((observed - 115.269).abs() < 1e-9);
    }

    #[test]
    fn wavelength_of_three_millimetres_is_about_one_hundred_ghz() {
        let ghz = wavelength_m_to_ghz(0.003);
        assert!((ghz - 99.93).abs() < 0.01);
    }
}
