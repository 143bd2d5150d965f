use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// One row of a running-viscosity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViscosityPoint {
    #[serde(rename = "time(ps)")]
    pub time_ps: f64,
    #[serde(rename = "viscosity(Pa.s)")]
    pub viscosity: f64,
}

/// Running viscosity in Pa·s against time in ps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViscosityTimeSeries {
    points: Vec<ViscosityPoint>,
}

impl ViscosityTimeSeries {
    pub fn new(points: Vec<ViscosityPoint>) -> Self {
        Self { points }
    }

    /// Pairs `times[i]` with `values[i]`; the shorter input bounds the length.
    pub fn from_parts(times: ArrayView1<f64>, values: ArrayView1<f64>) -> Self {
        let points = times
            .iter()
            .zip(values.iter())
            .map(|(&time_ps, &viscosity)| ViscosityPoint {
                time_ps,
                viscosity,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[ViscosityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&ViscosityPoint> {
        self.points.last()
    }

    pub fn viscosities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.viscosity)
    }

    /// Every `each`-th point starting at the first, each with its own time.
    pub fn downsample(&self, each: usize) -> Self {
        Self {
            points: self.points.iter().step_by(each.max(1)).copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcfPoint {
    #[serde(rename = "time(ps)")]
    pub time_ps: f64,
    #[serde(rename = "ACF")]
    pub value: f64,
}

/// Average stress ACF scaled so the zero-lag value is 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcfSeries {
    points: Vec<AcfPoint>,
}

impl AcfSeries {
    /// Normalizes `acf` by its first element. An ACF that is zero at lag 0
    /// (an all-zero signal) stays all zero instead of turning into NaN.
    pub fn normalized(times: ArrayView1<f64>, acf: ArrayView1<f64>) -> Self {
        let zero_lag = acf.get(0).copied().unwrap_or(0.0);
        let scale = if zero_lag != 0.0 { 1.0 / zero_lag } else { 0.0 };
        let points = times
            .iter()
            .zip(acf.iter())
            .map(|(&time_ps, &value)| AcfPoint {
                time_ps,
                value: value * scale,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[AcfPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn downsample_keeps_matching_times() {
        let series = ViscosityTimeSeries::from_parts(
            array![1.0, 2.0, 3.0, 4.0, 5.0].view(),
            array![10.0, 20.0, 30.0, 40.0, 50.0].view(),
        );
        let thinned = series.downsample(2);
        let times: Vec<f64> = thinned.points().iter().map(|p| p.time_ps).collect();
        let values: Vec<f64> = thinned.viscosities().collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
        assert_eq!(values, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn downsample_larger_than_series_keeps_first() {
        let series =
            ViscosityTimeSeries::from_parts(array![0.0, 1.0].view(), array![5.0, 6.0].view());
        assert_eq!(series.downsample(100).len(), 1);
    }

    #[test]
    fn normalized_acf_starts_at_one() {
        let acf = AcfSeries::normalized(array![0.0, 1.0, 2.0].view(), array![4.0, 2.0, -1.0].view());
        let values: Vec<f64> = acf.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 0.5, -0.25]);
    }

    #[test]
    fn normalized_zero_acf_stays_zero() {
        let acf = AcfSeries::normalized(array![0.0, 1.0].view(), array![0.0, 0.0].view());
        assert!(acf.points().iter().all(|p| p.value == 0.0));
    }
}
