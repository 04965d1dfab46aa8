//! Activation functions.

/// Scalar activation applied to every hidden node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Activation {
    /// `1 / (1 + e^-x)`
    Sigmoid,
    /// Hyperbolic tangent.
    #[default]
    Tanh,
    /// `max(0, x)`
    Relu,
    /// `x`
    Identity,
}

impl Activation {
    /// Applies the function to one value.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::Identity => x,
        }
    }
}

/// Vector activation applied to the output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputActivation {
    /// Normalizes outputs into a distribution that sums to 1.
    #[default]
    Softmax,
    /// Squashes each output independently.
    Elementwise(Activation),
}

impl OutputActivation {
    /// Applies the activation in place.
    pub fn apply(self, values: &mut [f64]) {
        match self {
            OutputActivation::Softmax => softmax(values),
            OutputActivation::Elementwise(f) => {
                for v in values.iter_mut() {
                    *v = f.apply(*v);
                }
            }
        }
    }
}

/// Softmax, shifted by the maximum so large sums cannot overflow.
fn softmax(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}
