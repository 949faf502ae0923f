use crate::error::{ControllerError, ControllerResult};
use crate::factory::Problem;
use std::f64::consts::FRAC_PI_2;

const REFERENCE_POINTS: usize = 100;

fn check_arity(problem: &dyn Problem, variables: &[f64]) -> ControllerResult<()> {
    if variables.len() != problem.number_of_variables() {
        return Err(ControllerError::Execution(format!(
            "{} expects {} variables, got {}",
            problem.name(),
            problem.number_of_variables(),
            variables.len()
        )));
    }
    Ok(())
}

/// Points `0, 1/(n-1), ..., 1`.
fn unit_steps(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| i as f64 / (n - 1) as f64)
}

/// Schaffer's single-variable problem: `x^2` vs `(x-2)^2`.
pub struct Schaffer;

impl Problem for Schaffer {
    fn name(&self) -> &str {
        "Schaffer"
    }

    fn number_of_variables(&self) -> usize {
        1
    }

    fn number_of_objectives(&self) -> usize {
        2
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(-10.0, 10.0)]
    }

    fn evaluate(&self, variables: &[f64]) -> ControllerResult<Vec<f64>> {
        check_arity(self, variables)?;
        let x = variables[0];
        Ok(vec![x * x, (x - 2.0).powi(2)])
    }

    fn reference_set(&self) -> Option<Vec<Vec<f64>>> {
        Some(
            unit_steps(REFERENCE_POINTS)
                .map(|t| 2.0 * t)
                .map(|x| vec![x * x, (x - 2.0).powi(2)])
                .collect(),
        )
    }
}

#[derive(Clone, Copy)]
enum ZdtShape {
    Convex,
    Concave,
}

/// The ZDT1 and ZDT2 test problems with 30 decision variables.
pub struct Zdt {
    shape: ZdtShape,
}

impl Zdt {
    pub const VARIABLES: usize = 30;

    pub fn zdt1() -> Self {
        Self {
            shape: ZdtShape::Convex,
        }
    }

    pub fn zdt2() -> Self {
        Self {
            shape: ZdtShape::Concave,
        }
    }

    fn h(&self, f1: f64, g: f64) -> f64 {
        match self.shape {
            ZdtShape::Convex => 1.0 - (f1 / g).sqrt(),
            ZdtShape::Concave => 1.0 - (f1 / g).powi(2),
        }
    }
}

impl Problem for Zdt {
    fn name(&self) -> &str {
        match self.shape {
            ZdtShape::Convex => "ZDT1",
            ZdtShape::Concave => "ZDT2",
        }
    }

    fn number_of_variables(&self) -> usize {
        Self::VARIABLES
    }

    fn number_of_objectives(&self) -> usize {
        2
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0); Self::VARIABLES]
    }

    fn evaluate(&self, variables: &[f64]) -> ControllerResult<Vec<f64>> {
        check_arity(self, variables)?;
        let f1 = variables[0];
        let tail: f64 = variables[1..].iter().sum();
        let g = 1.0 + 9.0 * tail / (Self::VARIABLES - 1) as f64;
        Ok(vec![f1, g * self.h(f1, g)])
    }

    fn reference_set(&self) -> Option<Vec<Vec<f64>>> {
        Some(
            unit_steps(REFERENCE_POINTS)
                .map(|f1| vec![f1, self.h(f1, 1.0)])
                .collect(),
        )
    }
}

/// DTLZ2 with two objectives and `k = 10` distance variables.
pub struct Dtlz2;

impl Dtlz2 {
    const OBJECTIVES: usize = 2;
    const K: usize = 10;
}

impl Problem for Dtlz2 {
    fn name(&self) -> &str {
        "DTLZ2_2"
    }

    fn number_of_variables(&self) -> usize {
        Self::OBJECTIVES + Self::K - 1
    }

    fn number_of_objectives(&self) -> usize {
        Self::OBJECTIVES
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0); self.number_of_variables()]
    }

    fn evaluate(&self, variables: &[f64]) -> ControllerResult<Vec<f64>> {
        check_arity(self, variables)?;
        let g: f64 = variables[Self::OBJECTIVES - 1..]
            .iter()
            .map(|x| (x - 0.5).powi(2))
            .sum();
        let theta = variables[0] * FRAC_PI_2;
        Ok(vec![(1.0 + g) * theta.cos(), (1.0 + g) * theta.sin()])
    }

    fn reference_set(&self) -> Option<Vec<Vec<f64>>> {
        Some(
            unit_steps(REFERENCE_POINTS)
                .map(|t| t * FRAC_PI_2)
                .map(|theta| vec![theta.cos(), theta.sin()])
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_solutions_land_on_the_reference_front() {
        let mut x = vec![0.0; Zdt::VARIABLES];
        x[0] = 0.25;
        assert_eq!(Zdt::zdt1().evaluate(&x).unwrap(), vec![0.25, 0.5]);
        assert_eq!(Zdt::zdt2().evaluate(&x).unwrap(), vec![0.25, 0.9375]);

        let mut y = vec![0.5; 11];
        y[0] = 0.0;
        let f = Dtlz2.evaluate(&y).unwrap();
        assert!((f[0] - 1.0).abs() < 1e-12 && f[1].abs() < 1e-12);
    }

    #[test]
    fn wrong_arity_is_an_execution_error() {
        assert!(matches!(
            Schaffer.evaluate(&[1.0, 2.0]),
            Err(ControllerError::Execution(_))
        ));
    }

    #[test]
    fn reference_sets_are_complete() {
        for p in [&Schaffer as &dyn Problem, &Zdt::zdt1(), &Dtlz2] {
            let rs = p.reference_set().unwrap();
            assert_eq!(rs.len(), REFERENCE_POINTS);
            assert!(rs.iter().all(|r| r.len() == p.number_of_objectives()));
        }
    }
}
