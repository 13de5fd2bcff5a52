//! Penner-style easing curves.
//!
//! Every curve uses the signature `f(t, b, c, d)`: `t` is elapsed time,
//! `b` the starting value, `c` the total change and `d` the duration, all in
//! the same unit. `f(0, b, c, d) == b` and `f(d, b, c, d) == b + c` for every
//! curve. The `*_out_in` variants run the `out` curve over the first half of
//! the change and the `in` curve over the second half.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// A plain easing function pointer. Embedders can install their own.
pub type EasingFn = fn(f64, f64, f64, f64) -> f64;

const BACK_OVERSHOOT: f64 = 1.70158;

fn out_in(out: EasingFn, inn: EasingFn, t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t < d / 2.0 {
        out(t * 2.0, b, c / 2.0, d)
    } else {
        inn(t * 2.0 - d, b + c / 2.0, c / 2.0, d)
    }
}

pub fn linear(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * t / d + b
}

pub fn quad_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t + b
}

pub fn quad_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    -c * t * (t - 2.0) + b
}

pub fn quad_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t + b;
    }
    let t = t - 1.0;
    -c / 2.0 * (t * (t - 2.0) - 1.0) + b
}

pub fn quad_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(quad_out, quad_in, t, b, c, d)
}

pub fn cubic_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t * t + b
}

pub fn cubic_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t * t * t + 1.0) + b
}

pub fn cubic_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * t + 2.0) + b
}

pub fn cubic_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(cubic_out, cubic_in, t, b, c, d)
}

pub fn quart_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t * t * t + b
}

pub fn quart_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    -c * (t * t * t * t - 1.0) + b
}

pub fn quart_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t * t + b;
    }
    let t = t - 2.0;
    -c / 2.0 * (t * t * t * t - 2.0) + b
}

pub fn quart_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(quart_out, quart_in, t, b, c, d)
}

pub fn quint_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t * t * t * t + b
}

pub fn quint_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t * t * t * t * t + 1.0) + b
}

pub fn quint_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t * t * t + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * t * t * t + 2.0) + b
}

pub fn quint_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(quint_out, quint_in, t, b, c, d)
}

pub fn sine_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    -c * (t / d * (PI / 2.0)).cos() + c + b
}

pub fn sine_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * (t / d * (PI / 2.0)).sin() + b
}

pub fn sine_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * (PI * t / 2.0).sin() + b;
    }
    let t = t - 1.0;
    -c / 2.0 * ((PI * t / 2.0).cos() - 2.0) + b
}

pub fn sine_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(sine_out, sine_in, t, b, c, d)
}

pub fn expo_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        b
    } else {
        c * 2f64.powf(10.0 * (t / d - 1.0)) + b
    }
}

pub fn expo_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == d {
        b + c
    } else {
        c * (-(2f64.powf(-10.0 * t / d)) + 1.0) + b
    }
}

pub fn expo_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    if t == d {
        return b + c;
    }
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * 2f64.powf(10.0 * (t - 1.0)) + b;
    }
    let t = t - 1.0;
    c / 2.0 * (-(2f64.powf(-10.0 * t)) + 2.0) + b
}

pub fn expo_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(expo_out, expo_in, t, b, c, d)
}

pub fn circ_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    -c * ((1.0 - t * t).sqrt() - 1.0) + b
}

pub fn circ_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (1.0 - t * t).sqrt() + b
}

pub fn circ_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return -c / 2.0 * ((1.0 - t * t).sqrt() - 1.0) + b;
    }
    let t = t - 2.0;
    c / 2.0 * ((1.0 - t * t).sqrt() + 1.0) + b
}

pub fn circ_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(circ_out, circ_in, t, b, c, d)
}

pub fn elastic_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    let t = t - 1.0;
    -(c * 2f64.powf(10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin()) + b
}

pub fn elastic_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    c * 2f64.powf(-10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin() + c + b
}

pub fn elastic_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t == 0.0 {
        return b;
    }
    let t = t / (d / 2.0);
    if t == 2.0 {
        return b + c;
    }
    let p = d * (0.3 * 1.5);
    let s = p / 4.0;
    let wave = |t: f64| ((t * d - s) * (2.0 * PI) / p).sin();
    if t < 1.0 {
        let t = t - 1.0;
        return -0.5 * (c * 2f64.powf(10.0 * t) * wave(t)) + b;
    }
    let t = t - 1.0;
    c * 2f64.powf(-10.0 * t) * wave(t) * 0.5 + c + b
}

pub fn elastic_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(elastic_out, elastic_in, t, b, c, d)
}

pub fn bounce_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    if t < 1.0 / 2.75 {
        c * (7.5625 * t * t) + b
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        c * (7.5625 * t * t + 0.75) + b
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        c * (7.5625 * t * t + 0.9375) + b
    } else {
        let t = t - 2.625 / 2.75;
        c * (7.5625 * t * t + 0.984375) + b
    }
}

pub fn bounce_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c - bounce_out(d - t, 0.0, c, d) + b
}

pub fn bounce_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if t < d / 2.0 {
        bounce_in(t * 2.0, 0.0, c, d) * 0.5 + b
    } else {
        bounce_out(t * 2.0 - d, 0.0, c, d) * 0.5 + c * 0.5 + b
    }
}

pub fn bounce_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(bounce_out, bounce_in, t, b, c, d)
}

pub fn back_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t * t * ((BACK_OVERSHOOT + 1.0) * t - BACK_OVERSHOOT) + b
}

pub fn back_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t * t * ((BACK_OVERSHOOT + 1.0) * t + BACK_OVERSHOOT) + 1.0) + b
}

pub fn back_in_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let s = BACK_OVERSHOOT * 1.525;
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * (t * t * ((s + 1.0) * t - s)) + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * ((s + 1.0) * t + s) + 2.0) + b
}

pub fn back_out_in(t: f64, b: f64, c: f64, d: f64) -> f64 {
    out_in(back_out, back_in, t, b, c, d)
}

/// Named easing curve, serializable so it can live in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    QuadOutIn,
    CubicIn,
    CubicOut,
    CubicInOut,
    CubicOutIn,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuartOutIn,
    QuintIn,
    QuintOut,
    QuintInOut,
    QuintOutIn,
    SineIn,
    SineOut,
    SineInOut,
    SineOutIn,
    ExpoIn,
    #[default]
    ExpoOut,
    ExpoInOut,
    ExpoOutIn,
    CircIn,
    CircOut,
    CircInOut,
    CircOutIn,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    ElasticOutIn,
    BounceIn,
    BounceOut,
    BounceInOut,
    BounceOutIn,
    BackIn,
    BackOut,
    BackInOut,
    BackOutIn,
}

impl Easing {
    pub const ALL: [Easing; 41] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::QuadOutIn,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::CubicOutIn,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuartOutIn,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
        Easing::QuintOutIn,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::SineOutIn,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::ExpoOutIn,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::CircOutIn,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::ElasticOutIn,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
        Easing::BounceOutIn,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::BackOutIn,
    ];

    pub fn function(self) -> EasingFn {
        match self {
            Easing::Linear => linear,
            Easing::QuadIn => quad_in,
            Easing::QuadOut => quad_out,
            Easing::QuadInOut => quad_in_out,
            Easing::QuadOutIn => quad_out_in,
            Easing::CubicIn => cubic_in,
            Easing::CubicOut => cubic_out,
            Easing::CubicInOut => cubic_in_out,
            Easing::CubicOutIn => cubic_out_in,
            Easing::QuartIn => quart_in,
            Easing::QuartOut => quart_out,
            Easing::QuartInOut => quart_in_out,
            Easing::QuartOutIn => quart_out_in,
            Easing::QuintIn => quint_in,
            Easing::QuintOut => quint_out,
            Easing::QuintInOut => quint_in_out,
            Easing::QuintOutIn => quint_out_in,
            Easing::SineIn => sine_in,
            Easing::SineOut => sine_out,
            Easing::SineInOut => sine_in_out,
            Easing::SineOutIn => sine_out_in,
            Easing::ExpoIn => expo_in,
            Easing::ExpoOut => expo_out,
            Easing::ExpoInOut => expo_in_out,
            Easing::ExpoOutIn => expo_out_in,
            Easing::CircIn => circ_in,
            Easing::CircOut => circ_out,
            Easing::CircInOut => circ_in_out,
            Easing::CircOutIn => circ_out_in,
            Easing::ElasticIn => elastic_in,
            Easing::ElasticOut => elastic_out,
            Easing::ElasticInOut => elastic_in_out,
            Easing::ElasticOutIn => elastic_out_in,
            Easing::BounceIn => bounce_in,
            Easing::BounceOut => bounce_out,
            Easing::BounceInOut => bounce_in_out,
            Easing::BounceOutIn => bounce_out_in,
            Easing::BackIn => back_in,
            Easing::BackOut => back_out,
            Easing::BackInOut => back_in_out,
            Easing::BackOutIn => back_out_in,
        }
    }

    pub fn apply(self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        (self.function())(t, b, c, d)
    }

    /// Normalized form: progress `p` in `[0, 1]` mapped onto `[0, 1]`
    /// (overshooting curves leave the range mid-way).
    pub fn sample(self, p: f64) -> f64 {
        self.apply(p.clamp(0.0, 1.0), 0.0, 1.0, 1.0)
    }
}
