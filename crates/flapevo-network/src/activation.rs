/// Smallest value [`sigmoid`] returns.
pub const SIGMOID_MIN: f32 = f32::EPSILON;

/// Largest value [`sigmoid`] returns.
pub const SIGMOID_MAX: f32 = 1.0 - f32::EPSILON;

/// Logistic function `1 / (1 + e^-x)`.
///
/// Uses the branch that never exponentiates a large positive number, so very
/// large `|x|` cannot overflow. The result is clamped to
/// [`SIGMOID_MIN`]..=[`SIGMOID_MAX`]: `f32` would otherwise round saturated
/// activations to exactly `0.0` or `1.0`, and callers rely on the output being
/// strictly inside `(0, 1)`.
///
/// # Examples
///
/// ```
/// use flapevo_network::sigmoid;
///
/// assert_eq!(sigmoid(0.0), 0.5);
/// assert!(sigmoid(1.0e6) < 1.0);
/// assert!(sigmoid(-1.0e6) > 0.0);
/// ```
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    let y = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    y.clamp(SIGMOID_MIN, SIGMOID_MAX)
}
