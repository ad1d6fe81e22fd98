use crate::clock::Millis;

pub fn mean(data: &[Millis]) -> Option<f64> {
    let sum = data.iter().map(|&x| x as f64).sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Population standard deviation around the unrounded mean
pub fn std_dev(data: &[Millis]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|&value| {
                    let diff = data_mean - value as f64;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Round half up to a whole number of milliseconds
pub fn round_ms(value: f64) -> Millis {
    (value + 0.5).floor().max(0.0) as Millis
}
