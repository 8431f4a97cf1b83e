use super::config::{AbsorptionWeightingType, SimulationOptions};
use super::photon::{Photon, PhotonState};
use super::random::uniform;
use crate::core::detectors::{TallyEvent, TallySink};
use crate::core::optics::fresnel;
use crate::core::optics::properties::OpticalProperties;
use crate::core::optics::scattering::{rotate_direction, sample_hg_cosine};
use crate::core::sources::SourceInput;
use crate::core::tissue::{BoundarySide, LayeredTissue};
use rand::Rng;
use std::f64::consts::PI;

/// Runs single photon histories through a layered tissue.
///
/// The engine holds only shared references and is cheap to copy into every worker. Events
/// are forwarded to the caller's sink as they happen; deciding whether to keep them is left
/// to the caller, based on the final [`PhotonState`].
#[derive(Debug, Clone, Copy)]
pub struct TransportEngine<'a> {
    tissue: &'a LayeredTissue,
    source: &'a SourceInput,
    options: &'a SimulationOptions,
}

impl<'a> TransportEngine<'a> {
    pub fn new(
        tissue: &'a LayeredTissue,
        source: &'a SourceInput,
        options: &'a SimulationOptions,
    ) -> Self {
        Self {
            tissue,
            source,
            options,
        }
    }

    /// Simulates one history from launch to termination and returns the final photon.
    pub fn run_history<R, S>(&self, rng: &mut R, sink: &mut S) -> Photon
    where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
    {
        self.run_history_observed(rng, sink, |_| {})
    }

    /// Same as [`run_history`](Self::run_history), handing the photon to `observe` after
    /// surface entrance and after every step.
    pub fn run_history_observed<R, S, F>(&self, rng: &mut R, sink: &mut S, mut observe: F) -> Photon
    where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
        F: FnMut(&Photon),
    {
        let mut photon = Photon::launched(self.source.launch(rng));

        if self.tissue.is_ambient(photon.region) {
            self.enter_tissue(&mut photon, rng, sink);
            observe(&photon);
        }

        while photon.is_alive() {
            if !photon.is_sane() {
                photon.state = PhotonState::Degenerate;
                break;
            }
            self.step(&mut photon, rng, sink);
            observe(&photon);
        }
        photon
    }

    fn interaction_coefficient(&self, op: &OpticalProperties) -> f64 {
        match self.options.absorption_weighting {
            AbsorptionWeightingType::Analog | AbsorptionWeightingType::Discrete => op.mut_total(),
            AbsorptionWeightingType::Continuous => op.mus(),
        }
    }

    /// Carries a photon launched in an ambient region onto the tissue surface, applying
    /// specular reflection and refraction.
    fn enter_tissue<R, S>(&self, photon: &mut Photon, rng: &mut R, sink: &mut S)
    where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
    {
        let Some((plane, neighbor)) = self.tissue.boundary_ahead(photon.region, photon.direction.z)
        else {
            photon.state = PhotonState::Degenerate;
            return;
        };
        let distance = (plane - photon.position.z) / photon.direction.z;
        photon.position += photon.direction * distance.max(0.0);
        photon.position.z = plane;

        let n1 = self.tissue.optical_properties(photon.region).n();
        let n2 = self.tissue.optical_properties(neighbor).n();
        let reflectance = fresnel::reflectance(n1, n2, photon.direction.z);
        let refracted = fresnel::refract(&photon.direction, n1, n2);

        let fully_reflected = match refracted {
            None => true,
            Some(_) if reflectance >= 1.0 => true,
            Some(_) => match self.options.absorption_weighting {
                AbsorptionWeightingType::Analog => {
                    reflectance > 0.0 && uniform(rng) < reflectance
                }
                AbsorptionWeightingType::Discrete | AbsorptionWeightingType::Continuous => {
                    if reflectance > 0.0 {
                        sink.record(&TallyEvent::Specular {
                            weight: reflectance * photon.weight,
                        });
                        photon.weight *= 1.0 - reflectance;
                    }
                    false
                }
            },
        };

        match refracted {
            Some(direction) if !fully_reflected => {
                photon.direction = direction;
                photon.region = neighbor;
            }
            _ => {
                sink.record(&TallyEvent::Specular {
                    weight: photon.weight,
                });
                photon.direction = fresnel::reflect(&photon.direction);
                photon.state = PhotonState::SpecularReflected;
            }
        }
    }

    fn step<R, S>(&self, photon: &mut Photon, rng: &mut R, sink: &mut S)
    where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
    {
        let op = *self.tissue.optical_properties(photon.region);
        let mu = self.interaction_coefficient(&op);

        if photon.step_remaining <= 0.0 {
            photon.step_remaining = -uniform(rng).ln();
        }
        let step = if mu > 0.0 {
            photon.step_remaining / mu
        } else {
            f64::INFINITY
        };
        let to_boundary = self.tissue.distance_to_boundary(
            photon.region,
            &photon.position,
            &photon.direction,
        );

        if to_boundary.is_infinite() && step.is_infinite() {
            photon.state = PhotonState::Degenerate;
            return;
        }

        if to_boundary <= step {
            photon.advance(to_boundary);
            if mu > 0.0 {
                photon.step_remaining = (photon.step_remaining - to_boundary * mu).max(0.0);
            }
            self.deposit_along_path(photon, &op, to_boundary, sink);
            self.cross_boundary(photon, rng, sink);
            self.count_collision(photon);
            return;
        }

        photon.advance(step);
        photon.step_remaining = 0.0;
        self.deposit_along_path(photon, &op, step, sink);
        self.count_collision(photon);
        if !photon.is_alive() {
            return;
        }

        self.absorb_at_site(photon, &op, rng, sink);
        if !photon.is_alive() {
            return;
        }

        let cos_theta = sample_hg_cosine(op.g(), uniform(rng));
        let phi = 2.0 * PI * uniform(rng);
        photon.direction = rotate_direction(&photon.direction, cos_theta, phi);

        self.play_roulette(photon, rng);
    }

    /// Continuous weighting: the segment just travelled absorbs `1 - exp(-mua * l)` of the
    /// weight, tallied at the segment end.
    fn deposit_along_path<S>(
        &self,
        photon: &mut Photon,
        op: &OpticalProperties,
        length: f64,
        sink: &mut S,
    ) where
        S: TallySink + ?Sized,
    {
        if self.options.absorption_weighting != AbsorptionWeightingType::Continuous
            || op.mua() <= 0.0
            || length <= 0.0
        {
            return;
        }
        let deposited = photon.weight * (1.0 - (-op.mua() * length).exp());
        if deposited > 0.0 {
            sink.record(&TallyEvent::Absorption {
                position: photon.position,
                weight: deposited,
                mua: op.mua(),
                region: photon.region,
            });
            photon.weight -= deposited;
        }
    }

    fn absorb_at_site<R, S>(
        &self,
        photon: &mut Photon,
        op: &OpticalProperties,
        rng: &mut R,
        sink: &mut S,
    ) where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
    {
        let probability = op.absorption_probability();
        match self.options.absorption_weighting {
            AbsorptionWeightingType::Analog => {
                if probability > 0.0 && uniform(rng) < probability {
                    sink.record(&TallyEvent::Absorption {
                        position: photon.position,
                        weight: photon.weight,
                        mua: op.mua(),
                        region: photon.region,
                    });
                    photon.state = PhotonState::Absorbed;
                }
            }
            AbsorptionWeightingType::Discrete => {
                let deposited = photon.weight * probability;
                if deposited > 0.0 {
                    sink.record(&TallyEvent::Absorption {
                        position: photon.position,
                        weight: deposited,
                        mua: op.mua(),
                        region: photon.region,
                    });
                    photon.weight -= deposited;
                }
            }
            AbsorptionWeightingType::Continuous => {}
        }
    }

    /// Fresnel reflection or Snell transmission at the boundary the photon sits on.
    fn cross_boundary<R, S>(&self, photon: &mut Photon, rng: &mut R, sink: &mut S)
    where
        R: Rng + ?Sized,
        S: TallySink + ?Sized,
    {
        let Some((plane, neighbor)) = self.tissue.boundary_ahead(photon.region, photon.direction.z)
        else {
            photon.state = PhotonState::Degenerate;
            return;
        };
        photon.position.z = plane;

        let n1 = self.tissue.optical_properties(photon.region).n();
        let n2 = self.tissue.optical_properties(neighbor).n();
        let reflectance = fresnel::reflectance(n1, n2, photon.direction.z);
        let refracted = fresnel::refract(&photon.direction, n1, n2);

        let reflects = match refracted {
            None => true,
            Some(_) => reflectance > 0.0 && uniform(rng) < reflectance,
        };
        match refracted {
            Some(direction) if !reflects => {
                photon.direction = direction;
                photon.region = neighbor;
            }
            _ => {
                photon.direction = fresnel::reflect(&photon.direction);
                return;
            }
        }

        if let Some(side) = self.tissue.exit_side(neighbor) {
            sink.record(&TallyEvent::Exit {
                side,
                position: photon.position,
                direction: photon.direction,
                weight: photon.weight,
            });
            photon.state = match side {
                BoundarySide::Top => PhotonState::ExitedTop,
                BoundarySide::Bottom => PhotonState::ExitedBottom,
            };
        }
    }

    /// Counts scattering sites and boundary reflections; photons that never escape are
    /// stopped once the limit is passed.
    fn count_collision(&self, photon: &mut Photon) {
        if !photon.is_alive() {
            return;
        }
        photon.collisions += 1;
        if photon.collisions > self.options.max_collisions {
            photon.state = PhotonState::KilledOverMaxCollisions;
        }
    }

    fn play_roulette<R: Rng + ?Sized>(&self, photon: &mut Photon, rng: &mut R) {
        if self.options.absorption_weighting == AbsorptionWeightingType::Analog {
            return;
        }
        let roulette = self.options.roulette;
        if photon.weight <= 0.0 || photon.weight >= roulette.weight_threshold {
            return;
        }
        if uniform(rng) < roulette.survival_chance {
            photon.weight /= roulette.survival_chance;
        } else {
            photon.state = PhotonState::KilledByRoulette;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tissue::TissueRegion;
    use crate::engine::random::stream_rng;
    use nalgebra::{Point3, Vector3};

    fn slab(mua: f64, musp: f64, g: f64, n: f64, thickness: f64, ambient_n: f64) -> LayeredTissue {
        let air = OpticalProperties::ambient(ambient_n).unwrap();
        LayeredTissue::new(vec![
            TissueRegion::layer(f64::NEG_INFINITY, 0.0, air),
            TissueRegion::layer(0.0, thickness, OpticalProperties::new(mua, musp, g, n).unwrap()),
            TissueRegion::layer(thickness, f64::INFINITY, air),
        ])
        .unwrap()
    }

    fn options(weighting: AbsorptionWeightingType) -> SimulationOptions {
        SimulationOptions {
            absorption_weighting: weighting,
            ..Default::default()
        }
    }

    fn weight_leaving(events: &[TallyEvent]) -> f64 {
        events.iter().map(TallyEvent::weight).sum()
    }

    #[test]
    fn transparent_matched_slab_transmits_straight_through() {
        let tissue = slab(0.0, 0.0, 0.0, 1.0, 10.0, 1.0);
        let source = SourceInput::default();
        let opts = options(AbsorptionWeightingType::Analog);
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(1, 0);

        for _ in 0..100 {
            let mut events = Vec::new();
            let photon = engine.run_history(&mut rng, &mut events);
            assert_eq!(photon.state, PhotonState::ExitedBottom);
            assert_eq!(photon.collisions, 0);
            assert!((photon.path_length - 10.0).abs() < 1e-9);
            assert_eq!(events.len(), 1);
            assert!(matches!(
                events[0],
                TallyEvent::Exit {
                    side: BoundarySide::Bottom,
                    weight,
                    ..
                } if weight == 1.0
            ));
        }
    }

    #[test]
    fn analog_weight_stays_one_until_termination() {
        let tissue = slab(0.1, 1.0, 0.8, 1.4, 2.0, 1.0);
        let source = SourceInput::default();
        let opts = options(AbsorptionWeightingType::Analog);
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(2, 0);

        for _ in 0..500 {
            let mut events = Vec::new();
            let photon = engine.run_history(&mut rng, &mut events);
            assert!(photon.state.is_terminal());
            assert_eq!(photon.weight, 1.0);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].weight(), 1.0);
        }
    }

    #[test]
    fn weighted_histories_conserve_weight_without_roulette() {
        let tissue = slab(0.3, 1.0, 0.5, 1.4, 1.0, 1.0);
        let source = SourceInput::default();
        for weighting in [
            AbsorptionWeightingType::Discrete,
            AbsorptionWeightingType::Continuous,
        ] {
            let mut opts = options(weighting);
            opts.roulette.weight_threshold = 0.0;
            let engine = TransportEngine::new(&tissue, &source, &opts);
            let mut rng = stream_rng(3, 0);

            for _ in 0..200 {
                let mut events = Vec::new();
                let photon = engine.run_history(&mut rng, &mut events);
                assert!(matches!(
                    photon.state,
                    PhotonState::ExitedTop | PhotonState::ExitedBottom
                ));
                assert!(photon.weight > 0.0 && photon.weight <= 1.0);
                assert!(
                    (weight_leaving(&events) - 1.0).abs() < 1e-9,
                    "{weighting}: events carried {}",
                    weight_leaving(&events)
                );
            }
        }
    }

    #[test]
    fn weighted_entrance_deducts_fresnel_specular() {
        let tissue = slab(0.0, 1.0, 0.0, 1.4, 1.0, 1.0);
        let source = SourceInput::default();
        let opts = options(AbsorptionWeightingType::Continuous);
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(4, 0);

        let mut events = Vec::new();
        engine.run_history(&mut rng, &mut events);
        let expected = ((1.0_f64 - 1.4) / (1.0 + 1.4)).powi(2);
        match events[0] {
            TallyEvent::Specular { weight } => assert!((weight - expected).abs() < 1e-12),
            other => panic!("expected specular event first, got {other:?}"),
        }
    }

    #[test]
    fn analog_entrance_reflects_whole_photon_at_fresnel_rate() {
        let tissue = slab(0.0, 1.0, 0.0, 1.4, 1.0, 1.0);
        let source = SourceInput::default();
        let opts = options(AbsorptionWeightingType::Analog);
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(5, 0);

        let count = 20_000;
        let specular = (0..count)
            .filter(|_| {
                let mut events = Vec::new();
                engine.run_history(&mut rng, &mut events).state == PhotonState::SpecularReflected
            })
            .count();
        let rate = specular as f64 / count as f64;
        let expected = ((1.0_f64 - 1.4) / (1.0 + 1.4)).powi(2);
        assert!((rate - expected).abs() < 0.006, "rate {rate}, expected {expected}");
    }

    #[test]
    fn roulette_keeps_weight_bounded() {
        let tissue = slab(1.0, 1.0, 0.0, 1.0, 50.0, 1.0);
        let source = SourceInput::default();
        let mut opts = options(AbsorptionWeightingType::Discrete);
        opts.roulette.weight_threshold = 0.01;
        opts.roulette.survival_chance = 0.1;
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(6, 0);

        let mut killed = 0;
        for _ in 0..200 {
            let mut events = Vec::new();
            let photon = engine.run_history(&mut rng, &mut events);
            assert!(photon.weight <= 1.0);
            assert!(events.iter().all(|e| e.weight() > 0.0 && e.weight() <= 1.0));
            if photon.state == PhotonState::KilledByRoulette {
                killed += 1;
            }
        }
        assert!(killed > 0);
    }

    #[test]
    fn weight_stays_in_unit_interval_after_every_step() {
        let tissue = slab(0.5, 1.0, 0.8, 1.4, 5.0, 1.0);
        let source = SourceInput::default();
        for weighting in [
            AbsorptionWeightingType::Analog,
            AbsorptionWeightingType::Discrete,
            AbsorptionWeightingType::Continuous,
        ] {
            let mut opts = options(weighting);
            opts.roulette.weight_threshold = 0.05;
            opts.roulette.survival_chance = 0.1;
            let engine = TransportEngine::new(&tissue, &source, &opts);
            let mut rng = stream_rng(21, 0);

            let mut weights = Vec::new();
            for _ in 0..200 {
                let mut events = Vec::new();
                engine.run_history_observed(&mut rng, &mut events, |photon| {
                    weights.push(photon.weight)
                });
            }
            assert!(weights.len() > 200);
            assert!(
                weights.iter().all(|&w| w > 0.0 && w <= 1.0),
                "{weighting:?} produced a weight outside (0, 1]"
            );
        }
    }

    #[test]
    fn trapped_photon_is_stopped_by_collision_limit() {
        let tissue = slab(0.0, 0.0, 0.0, 1.5, 1.0, 1.0);
        let source = SourceInput::DirectionalPoint {
            position: Point3::new(0.0, 0.0, 0.5),
            direction: Vector3::new(0.9, 0.0, 0.1).normalize(),
            initial_region: 1,
        };
        let mut opts = options(AbsorptionWeightingType::Analog);
        opts.max_collisions = 50;
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(7, 0);

        let mut events = Vec::new();
        let photon = engine.run_history(&mut rng, &mut events);
        assert_eq!(photon.state, PhotonState::KilledOverMaxCollisions);
        assert!(events.is_empty());
    }

    #[test]
    fn photon_parallel_to_layers_in_empty_medium_is_degenerate() {
        let tissue = slab(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let source = SourceInput::DirectionalPoint {
            position: Point3::new(0.0, 0.0, 0.5),
            direction: Vector3::x(),
            initial_region: 1,
        };
        let opts = options(AbsorptionWeightingType::Analog);
        let engine = TransportEngine::new(&tissue, &source, &opts);
        let mut rng = stream_rng(8, 0);

        let photon = engine.run_history(&mut rng, &mut Vec::new());
        assert_eq!(photon.state, PhotonState::Degenerate);
    }
}
