//! HLLC interface solver.
//!
//! Fluxes are computed in the face frame (normal, tangent, binormal) and
//! momentum components are rotated back to the global frame. Volume
//! fractions and transported scalars are upwinded at the contact speed
//! s_M; their non-conservative counterparts are added per cell through
//! [`Flux::add_non_cons`].

use mf_core::{Frame, Vec3};

use crate::closure::Closure;
use crate::error::{ModelError, ModelResult};
use crate::flux::{ConsLayout, Flux};
use crate::model::Model;
use crate::state::CellState;

/// Wave-speed estimates and contact of a two-state problem.
#[derive(Clone, Copy, Debug)]
struct Waves {
    s_l: f64,
    s_r: f64,
    s_m: f64,
    p_star: f64,
}

/// Davis wave speeds with Toro's contact speed, for a state described by
/// (density, normal velocity, pressure, sound speed) on each side.
fn waves(l: (f64, f64, f64, f64), r: (f64, f64, f64, f64)) -> Waves {
    let (rho_l, u_l, p_l, c_l) = l;
    let (rho_r, u_r, p_r, c_r) = r;
    let s_l = (u_l - c_l).min(u_r - c_r);
    let s_r = (u_l + c_l).max(u_r + c_r);
    let m_l = rho_l * (s_l - u_l);
    let m_r = rho_r * (s_r - u_r);
    let den = m_l - m_r;
    let s_m = if den.abs() > f64::MIN_POSITIVE {
        (p_r - p_l + m_l * u_l - m_r * u_r) / den
    } else {
        0.5 * (u_l + u_r)
    };
    Waves {
        s_l,
        s_r,
        s_m,
        p_star: p_l + m_l * (s_m - u_l),
    }
}

/// Which state the HLLC fan selects at the face.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Region {
    Left,
    LeftStar(f64),
    RightStar(f64),
    Right,
}

fn region(s_l: f64, s_m: f64, s_r: f64) -> Region {
    if s_l >= 0.0 {
        Region::Left
    } else if s_m >= 0.0 {
        Region::LeftStar(s_l)
    } else if s_r > 0.0 {
        Region::RightStar(s_r)
    } else {
        Region::Right
    }
}

/// Mixture-velocity closures: Euler, UEq, PUEq, PTUEq.
fn shared_velocity_flux(layout: &ConsLayout, left: &CellState, right: &CellState, frame: &Frame, out: &mut Flux) {
    let ul = frame.to_local(&left.mixture.velocity);
    let ur = frame.to_local(&right.mixture.velocity);
    let ml = &left.mixture;
    let mr = &right.mixture;
    let w = waves(
        (ml.density, ul.x, ml.pressure, ml.sound_speed),
        (mr.density, ur.x, mr.pressure, mr.sound_speed),
    );

    let (state, u, s) = match region(w.s_l, w.s_m, w.s_r) {
        Region::Left | Region::LeftStar(_) => (left, ul, w.s_l),
        Region::RightStar(_) | Region::Right => (right, ur, w.s_r),
    };
    let star = matches!(region(w.s_l, w.s_m, w.s_r), Region::LeftStar(_) | Region::RightStar(_));
    let rho = state.mixture.density;
    let p = state.mixture.pressure;
    let rho_e: f64 = state.phases.iter().map(|ph| ph.mass() * ph.energy).sum();
    let total = rho_e / rho + 0.5 * u.norm_squared();

    // F* = F + S (U* - U); every mass-like slot scales by the same factor.
    let factor = if star { (s - u.x) / (s - w.s_m) } else { 1.0 };
    let transported = |q: f64| if star { q * u.x + s * (q * factor - q) } else { q * u.x };

    let v = out.values_mut();
    for (k, ph) in state.phases.iter().enumerate() {
        let m = ph.mass();
        v[layout.mass(k)] = transported(m);
        if let Some(e) = layout.phase_energy(k) {
            v[e] = transported(m * ph.energy);
        }
    }

    let mom = layout.momentum().unwrap_or_default();
    let mut local = Vec3::new(rho * u.x * u.x + p, rho * u.x * u.y, rho * u.x * u.z);
    let mut energy = (rho * total + p) * u.x;
    if star {
        let rho_star = rho * factor;
        let u_star = Vec3::new(w.s_m, u.y, u.z);
        local += s * (rho_star * u_star - rho * u);
        let e_star = rho_star * (total + (w.s_m - u.x) * (w.s_m + p / (rho * (s - u.x))));
        energy += s * (e_star - rho * total);
    }
    let global = frame.to_global(&local);
    v[mom..mom + 3].copy_from_slice(global.as_slice());
    v[mom + 3] = energy;

    finish(layout, left, right, w.s_m, w.p_star, out);
}

/// Non-equilibrium closure: one HLLC fan per phase on (αρ, αρu, αρE)
/// with phase pressure α p; the mixture fan provides s_M and p_I.
fn non_equilibrium_flux(layout: &ConsLayout, left: &CellState, right: &CellState, frame: &Frame, out: &mut Flux) {
    let ml = &left.mixture;
    let mr = &right.mixture;
    let mix = waves(
        (ml.density, frame.to_local(&ml.velocity).x, ml.pressure, ml.sound_speed),
        (mr.density, frame.to_local(&mr.velocity).x, mr.pressure, mr.sound_speed),
    );

    for (k, (pl, pr)) in left.phases.iter().zip(&right.phases).enumerate() {
        let ul = frame.to_local(&pl.velocity);
        let ur = frame.to_local(&pr.velocity);
        let w = waves(
            (pl.mass(), ul.x, pl.alpha * pl.pressure, pl.sound_speed),
            (pr.mass(), ur.x, pr.alpha * pr.pressure, pr.sound_speed),
        );
        let reg = region(w.s_l, w.s_m, w.s_r);
        let (ph, u, s) = match reg {
            Region::Left | Region::LeftStar(_) => (pl, ul, w.s_l),
            Region::RightStar(_) | Region::Right => (pr, ur, w.s_r),
        };
        let star = matches!(reg, Region::LeftStar(_) | Region::RightStar(_));
        let m = ph.mass();
        let ap = ph.alpha * ph.pressure;

        let mut mass = m * u.x;
        let mut local = Vec3::new(m * u.x * u.x + ap, m * u.x * u.y, m * u.x * u.z);
        let mut energy = (m * ph.total_energy + ap) * u.x;
        if star {
            let factor = (s - u.x) / (s - w.s_m);
            let m_star = m * factor;
            mass += s * (m_star - m);
            local += s * (m_star * Vec3::new(w.s_m, u.y, u.z) - m * u);
            let e_star = m_star
                * (ph.total_energy + (w.s_m - u.x) * (w.s_m + ph.pressure / (ph.density * (s - u.x))));
            energy += s * (e_star - m * ph.total_energy);
        }

        let v = out.values_mut();
        v[layout.mass(k)] = mass;
        if let (Some(mo), Some(e)) = (layout.phase_momentum(k), layout.phase_energy(k)) {
            v[mo..mo + 3].copy_from_slice(frame.to_global(&local).as_slice());
            v[e] = energy;
        }
    }

    finish(layout, left, right, mix.s_m, mix.p_star, out);
}

/// Upwind the advected fractions and scalars and record interface values.
fn finish(layout: &ConsLayout, left: &CellState, right: &CellState, s_m: f64, p_star: f64, out: &mut Flux) {
    let upwind = if s_m >= 0.0 { left } else { right };
    for (k, ph) in upwind.phases.iter().enumerate() {
        if let Some(a) = layout.alpha(k) {
            out.values_mut()[a] = ph.alpha * s_m;
        }
    }
    for (i, c) in upwind.transports.iter().enumerate() {
        out.values_mut()[layout.transport(i)] = c * s_m;
    }
    let iv = out.interface_mut();
    iv.s_m = s_m;
    iv.p_i = p_star;
    for (a, ph) in iv.alphas.iter_mut().zip(&upwind.phases) {
        *a = ph.alpha;
    }
    iv.transports.clone_from(&upwind.transports);
}

/// Flux through a face from `left` (behind the normal) to `right`.
pub fn solve_interface(model: &Model, left: &CellState, right: &CellState, frame: &Frame) -> ModelResult<Flux> {
    let layout = model.layout();
    let mut out = Flux::new(*layout);
    match layout.closure() {
        Closure::NonEq => non_equilibrium_flux(layout, left, right, frame, &mut out),
        _ => shared_velocity_flux(layout, left, right, frame, &mut out),
    }
    if !out.is_finite() || !out.interface().s_m.is_finite() {
        return Err(ModelError::numerical("non-finite interface flux"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use mf_eos::{Eos, EosKind};

    fn euler() -> Model {
        let gas = Eos::from_params(EosKind::IdealGas, &[1.4, 2.5, 0.0]).unwrap();
        Model::new(Closure::Euler, vec![gas], &[], 0).unwrap()
    }

    fn gas_state(model: &Model, rho: f64, p: f64, u: f64) -> CellState {
        model
            .build_state(vec![Phase::new(1.0, rho, p, Vec3::new(u, 0.0, 0.0))], vec![])
            .unwrap()
    }

    #[test]
    fn uniform_state_gives_physical_flux() {
        let model = euler();
        let s = gas_state(&model, 1.0, 1.0, 0.5);
        let f = solve_interface(&model, &s, &s, &Frame::x_axis()).unwrap();
        let e = 1.0 / 0.4 + 0.125;
        assert!((f.mass(0) - 0.5).abs() < 1e-14);
        assert!((f.momentum().x - (0.25 + 1.0)).abs() < 1e-14);
        assert!((f.total_energy() - (e + 1.0) * 0.5).abs() < 1e-14);
        assert!((f.interface().s_m - 0.5).abs() < 1e-14);
    }

    #[test]
    fn sod_interface_pushes_mass_to_the_right() {
        let model = euler();
        let l = gas_state(&model, 1.0, 1.0, 0.0);
        let r = gas_state(&model, 0.125, 0.1, 0.0);
        let f = solve_interface(&model, &l, &r, &Frame::x_axis()).unwrap();
        assert!(f.mass(0) > 0.0);
        assert!(f.total_energy() > 0.0);
        assert!(f.momentum().x > 0.1 && f.momentum().x < 1.0);
        assert!(f.interface().s_m > 0.0);
        assert!(f.momentum().y.abs() < 1e-15);
    }

    #[test]
    fn reversed_face_mirrors_the_flux() {
        let model = euler();
        let l = gas_state(&model, 1.0, 1.0, 0.2);
        let r = gas_state(&model, 0.5, 0.4, -0.1);
        let frame = Frame::x_axis();
        let f = solve_interface(&model, &l, &r, &frame).unwrap();
        let mirror = |s: &CellState| {
            let mut m = s.clone();
            m.phases[0].velocity.x = -m.phases[0].velocity.x;
            m.refresh_mixture(Closure::Euler);
            m
        };
        let g = solve_interface(&model, &mirror(&r), &mirror(&l), &frame).unwrap();
        assert!((f.mass(0) + g.mass(0)).abs() < 1e-13);
        assert!((f.momentum().x - g.momentum().x).abs() < 1e-13);
        assert!((f.total_energy() + g.total_energy()).abs() < 1e-13);
    }

    #[test]
    fn rotated_face_gives_rotated_momentum() {
        let model = euler();
        let l = gas_state(&model, 1.0, 1.0, 0.0);
        let r = gas_state(&model, 0.125, 0.1, 0.0);
        let fx = solve_interface(&model, &l, &r, &Frame::x_axis()).unwrap();
        let frame = Frame::from_normal(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let rot = |s: &CellState| {
            let mut m = s.clone();
            m.phases[0].velocity = frame.to_global(&s.phases[0].velocity);
            m.refresh_mixture(Closure::Euler);
            m
        };
        let fy = solve_interface(&model, &rot(&l), &rot(&r), &frame).unwrap();
        assert!((fx.mass(0) - fy.mass(0)).abs() < 1e-14);
        assert!((fy.momentum() - Vec3::new(0.0, fx.momentum().x, 0.0)).norm() < 1e-13);
    }
}
