use log::debug;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use super::leds::LedChannels;

/// Full brightness, in percent
pub const DUTY_CYCLE: u8 = 100;

/// Red, green and blue duty cycles, each in `0.0..=100.0`
pub type Colour = [f64; 3];

pub const BLACK: Colour = [0.0, 0.0, 0.0];

const STEP_DELAY: Duration = Duration::from_millis(100);
const PEAK_PAUSE: Duration = Duration::from_millis(200);

/// Random colour: each channel is off half the time, otherwise 0-100
pub fn draw_colour<R: Rng>(rng: &mut R) -> Colour {
    let mut colour = BLACK;
    for channel in colour.iter_mut() {
        *channel = rng.gen_range(0..=DUTY_CYCLE) as f64 * rng.gen_range(0..=1) as f64;
    }
    colour
}

/// Scale a colour so its brightest channel sits at full duty cycle.
///
/// Black cannot be scaled and yields `None`.
pub fn brighten(colour: Colour) -> Option<Colour> {
    let scale = colour.iter().copied().fold(0.0, f64::max);
    if scale <= 0.0 {
        return None;
    }
    Some(colour.map(|channel| DUTY_CYCLE as f64 * channel / scale))
}

/// Number of fade steps between two colours: their distance, rounded down.
///
/// Using the distance keeps the fade speed even whichever colours we move between.
pub fn step_count(from: &Colour, to: &Colour) -> u32 {
    let sum_squares: f64 = from.iter().zip(to).map(|(a, b)| (a - b).powi(2)).sum();
    sum_squares.sqrt() as u32
}

/// A linear fade from one colour to another
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Colour,
    pub target: Colour,
    pub steps: u32,
    gradient: Colour,
}

impl Transition {
    /// `None` when the colours are too close to need a single step
    pub fn new(from: Colour, target: Colour) -> Option<Self> {
        let steps = step_count(&from, &target);
        if steps == 0 {
            return None;
        }

        let mut gradient = BLACK;
        for (g, (base, end)) in gradient.iter_mut().zip(from.iter().zip(&target)) {
            *g = (end - base) / steps as f64;
        }

        Some(Transition {
            from,
            target,
            steps,
            gradient,
        })
    }

    /// Duty cycles for step `step`, truncated to whole percent
    pub fn duty_cycles(&self, step: u32) -> [u8; 3] {
        let mut duty = [0u8; 3];
        for (d, (base, gradient)) in duty.iter_mut().zip(self.from.iter().zip(&self.gradient)) {
            *d = (base + step as f64 * gradient) as u8;
        }
        duty
    }
}

/// Draw colours until one makes a fade away from `last`.
///
/// Black draws are skipped, as are targets too close to `last` to need a step.
pub fn next_transition<R: Rng>(rng: &mut R, last: Colour) -> Transition {
    loop {
        let Some(target) = brighten(draw_colour(rng)) else {
            continue;
        };
        if let Some(transition) = Transition::new(last, target) {
            return transition;
        }
    }
}

/// Play one fade, one step every 100ms, then hold the peak briefly
pub async fn play<L: LedChannels>(
    leds: &mut L,
    transition: &Transition,
) -> Result<(), Box<dyn std::error::Error>> {
    for step in 0..transition.steps {
        leds.set_duty_cycles(transition.duty_cycles(step))?;
        sleep(STEP_DELAY).await;
    }
    sleep(PEAK_PAUSE).await;
    Ok(())
}

/// Fade between random colours until an LED write fails.
///
/// Starts from black; run it under a `select!` with a shutdown signal.
pub async fn animate<L, R>(leds: &mut L, rng: &mut R) -> Result<(), Box<dyn std::error::Error>>
where
    L: LedChannels,
    R: Rng,
{
    let mut last_colour = BLACK;

    loop {
        let transition = next_transition(rng, last_colour);
        debug!(
            "Fading to {:?} over {} steps",
            transition.target, transition.steps
        );

        play(leds, &transition).await?;
        last_colour = transition.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct RecordingLeds {
        writes: Vec<[u8; 3]>,
    }

    impl LedChannels for RecordingLeds {
        fn set_duty_cycles(&mut self, duty: [u8; 3]) -> Result<(), Box<dyn std::error::Error>> {
            self.writes.push(duty);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    #[test]
    fn brighten_scales_to_full_duty() {
        assert_eq!(brighten([50.0, 25.0, 0.0]), Some([100.0, 50.0, 0.0]));
        assert_eq!(brighten([0.0, 0.0, 7.0]), Some([0.0, 0.0, 100.0]));
        assert_eq!(brighten(BLACK), None);
    }

    #[test]
    fn step_count_is_truncated_distance() {
        assert_eq!(step_count(&BLACK, &[100.0, 0.0, 0.0]), 100);
        assert_eq!(step_count(&[100.0, 0.0, 0.0], &[0.0, 100.0, 0.0]), 141);
        assert_eq!(step_count(&[100.0, 0.0, 0.0], &[100.0, 0.5, 0.0]), 0);
    }

    #[test]
    fn fade_from_black_to_red() {
        let transition = Transition::new(BLACK, [100.0, 0.0, 0.0]).unwrap();

        assert_eq!(transition.steps, 100);
        for step in 0..transition.steps {
            assert_eq!(transition.duty_cycles(step), [step as u8, 0, 0]);
        }
    }

    #[test]
    fn fade_down_truncates() {
        let transition = Transition::new([100.0, 0.0, 0.0], [0.0, 100.0, 0.0]).unwrap();

        assert_eq!(transition.duty_cycles(0), [100, 0, 0]);
        // 100 - 100/141 and 100/141
        assert_eq!(transition.duty_cycles(1), [99, 0, 0]);
        assert_eq!(transition.duty_cycles(2), [98, 1, 0]);
    }

    #[test]
    fn no_transition_between_identical_colours() {
        assert_eq!(Transition::new([100.0, 0.0, 0.0], [100.0, 0.0, 0.0]), None);
    }

    #[test]
    fn next_transition_never_targets_black() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut last = BLACK;

        for _ in 0..500 {
            let transition = next_transition(&mut rng, last);
            assert_ne!(transition.target, BLACK);
            assert!(transition.steps > 0);
            let peak = transition.target.iter().copied().fold(0.0, f64::max);
            assert!((peak - 100.0).abs() < 1e-9);
            last = transition.target;
        }
    }

    /// Accepts a fixed number of writes, then fails to end the animation
    struct LimitedLeds {
        writes: Vec<[u8; 3]>,
        limit: usize,
    }

    impl LedChannels for LimitedLeds {
        fn set_duty_cycles(&mut self, duty: [u8; 3]) -> Result<(), Box<dyn std::error::Error>> {
            if self.writes.len() == self.limit {
                return Err("LED write limit reached".into());
            }
            self.writes.push(duty);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn animate_starts_each_fade_from_the_last_target() {
        let mut rng = StdRng::seed_from_u64(11);
        let first = next_transition(&mut StdRng::seed_from_u64(11), BLACK);
        let first_steps = first.steps as usize;
        let mut leds = LimitedLeds {
            writes: Vec::new(),
            limit: first_steps + 1,
        };
        let start = tokio::time::Instant::now();

        let result = animate(&mut leds, &mut rng).await;

        assert!(result.is_err());
        assert_eq!(leds.writes.len(), first_steps + 1);
        assert_eq!(leds.writes[0], [0, 0, 0]);
        // The second fade opens at the first fade's target
        assert_eq!(leds.writes[first_steps], first.target.map(|c| c as u8));
        assert_eq!(
            start.elapsed(),
            STEP_DELAY * first.steps + PEAK_PAUSE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn play_writes_every_step() {
        let mut leds = RecordingLeds::default();
        let transition = Transition::new(BLACK, [100.0, 0.0, 0.0]).unwrap();

        play(&mut leds, &transition).await.unwrap();

        assert_eq!(leds.writes.len(), 100);
        assert_eq!(leds.writes[0], [0, 0, 0]);
        assert_eq!(leds.writes[42], [42, 0, 0]);
        assert_eq!(leds.writes[99], [99, 0, 0]);
    }
}
