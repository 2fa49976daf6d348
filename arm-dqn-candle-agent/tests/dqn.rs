use anyhow::Result;
use arm_dqn_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig, EpsilonGreedy, TargetUpdate, UpdateMode},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
};
use arm_dqn_core::{
    dummy::CountdownEnv,
    error::ArmDqnError,
    replay_buffer::{ReplayBuffer, ReplayBufferConfig, Transition, TransitionBatch},
    Agent, DiscreteAct, ExperienceBufferBase, Policy, ReplayBufferBase, VecObs,
};
use tempdir::TempDir;

type Buffer = ReplayBuffer<VecObs, DiscreteAct>;
type DqnAgent = Dqn<CountdownEnv, Mlp, Buffer>;

fn config(units: Vec<usize>) -> DqnConfig<MlpConfig> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(6, units, 8, false))
        .opt_config(OptimizerConfig::Adam { lr: 0.001 });
    DqnConfig::default().model_config(model_config)
}

fn state(i: usize) -> VecObs {
    VecObs((0..6).map(|j| ((i * 7 + j * 3) % 11) as f32 / 11.0).collect())
}

fn transition(i: usize) -> Transition<VecObs, DiscreteAct> {
    let reward = if i % 2 == 0 { 10.0 } else { -10.0 };
    Transition::new(state(i), DiscreteAct(i % 8), reward, state(i + 1))
}

fn batch(n: usize) -> TransitionBatch<VecObs, DiscreteAct> {
    (0..n).map(transition).collect::<Vec<_>>().into()
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-6, "{:?} != {:?}", a, b);
    }
}

#[test]
fn test_target_equals_online_at_construction() -> Result<()> {
    let agent = DqnAgent::build(config(vec![64, 64, 64]))?;
    for i in 0..5 {
        let q = agent.q_values(&state(i))?;
        assert_eq!(q.len(), 8);
        assert_eq!(q, agent.target_q_values(&state(i))?);
    }
    Ok(())
}

#[test]
fn test_hard_sync_every_interval() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![64, 64, 64]).target_update_interval(2))?;
    let batch = batch(64);

    agent.update(&batch)?;
    assert_eq!(agent.update_count(), 1);
    assert_ne!(agent.q_values(&state(0))?, agent.target_q_values(&state(0))?);

    agent.update(&batch)?;
    assert_eq!(agent.update_count(), 2);
    for i in 0..5 {
        assert_eq!(agent.q_values(&state(i))?, agent.target_q_values(&state(i))?);
    }
    Ok(())
}

#[test]
fn test_update_lowers_loss_on_fixed_batch() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![64, 64, 64]).discount_factor(0.0))?;
    let batch = batch(64);

    let loss_before = agent.loss(&batch)?;
    let loss = agent.update(&batch)?;
    let loss_after = agent.loss(&batch)?;

    assert_eq!(loss, Some(loss_before));
    assert!(loss_after < loss_before, "{} >= {}", loss_after, loss_before);
    Ok(())
}

#[test]
fn test_update_with_adamw_lowers_loss() -> Result<()> {
    let model_config = DqnModelConfig::default()
        .q_config(MlpConfig::new(6, vec![64, 64, 64], 8, false))
        .opt_config(OptimizerConfig::AdamW {
            lr: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.01,
        });
    let config = DqnConfig::default()
        .model_config(model_config)
        .discount_factor(0.0);
    let mut agent = DqnAgent::build(config)?;
    let batch = batch(64);

    let loss_before = agent.loss(&batch)?;
    agent.update(&batch)?;
    let loss_after = agent.loss(&batch)?;
    assert!(loss_after < loss_before, "{} >= {}", loss_after, loss_before);
    Ok(())
}

fn argmax(q: &[f32]) -> usize {
    let mut ix = 0;
    for (i, v) in q.iter().enumerate() {
        if *v > q[ix] {
            ix = i;
        }
    }
    ix
}

#[test]
fn test_loss_uses_double_q_target() -> Result<()> {
    let gamma = 0.99;
    let config = config(vec![64, 64, 64])
        .discount_factor(gamma)
        .target_update_interval(1000);
    let mut agent = DqnAgent::build(config)?;
    let batch = batch(64);

    // Moves the online network away from the frozen target network.
    for _ in 0..20 {
        agent.update(&batch)?;
    }

    let (mut double, mut vanilla, mut n_differs) = (0f64, 0f64, 0);
    for tr in batch.iter() {
        let pred = agent.q_values(tr.state())?[tr.action().0] as f64;
        let q_next = agent.q_values(tr.next_state())?;
        let q_next_tgt = agent.target_q_values(tr.next_state())?;
        let a_online = argmax(&q_next);
        let a_target = argmax(&q_next_tgt);
        if a_online != a_target {
            n_differs += 1;
        }

        let r = tr.reward() as f64;
        let y_double = r + gamma * q_next_tgt[a_online] as f64;
        let y_vanilla = r + gamma * q_next_tgt[a_target] as f64;
        double += (pred - y_double).powi(2);
        vanilla += (pred - y_vanilla).powi(2);
    }
    let n = batch.len() as f64;
    let (double, vanilla) = (double / n, vanilla / n);

    let loss = agent.loss(&batch)? as f64;
    assert!(n_differs > 0);
    assert!(
        (loss - double).abs() <= 1e-4 * double.max(1.0),
        "loss={} double={}",
        loss,
        double
    );
    assert!(
        (loss - vanilla).abs() > 1e-3 * vanilla.max(1.0),
        "loss={} vanilla={}",
        loss,
        vanilla
    );
    Ok(())
}

#[test]
fn test_polyak_sync_moves_target_toward_online() -> Result<()> {
    let config = config(vec![64, 64, 64])
        .target_update(TargetUpdate::Polyak { tau: 0.5 })
        .target_update_interval(1);
    let mut agent = DqnAgent::build(config)?;
    let target_before = agent.target_q_values(&state(0))?;

    agent.update(&batch(64))?;
    let online = agent.q_values(&state(0))?;
    let target = agent.target_q_values(&state(0))?;
    assert_ne!(target, online);
    assert_ne!(target, target_before);
    Ok(())
}

#[test]
fn test_polyak_sync_with_unit_tau_copies_online() -> Result<()> {
    let config = config(vec![64, 64, 64])
        .target_update(TargetUpdate::Polyak { tau: 1.0 })
        .target_update_interval(1);
    let mut agent = DqnAgent::build(config)?;
    let target_before = agent.target_q_values(&state(0))?;

    agent.update(&batch(64))?;
    assert_ne!(agent.target_q_values(&state(0))?, target_before);
    for i in 0..5 {
        assert_close(&agent.q_values(&state(i))?, &agent.target_q_values(&state(i))?);
    }
    Ok(())
}

#[test]
fn test_epsilon_decays_every_interval() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![16]).decay_interval(10))?;
    let batch = batch(8);

    for _ in 0..9 {
        agent.update(&batch)?;
    }
    assert_eq!(agent.epsilon(), 1.0);
    agent.update(&batch)?;
    assert!((agent.epsilon() - 0.999).abs() < 1e-12);

    agent.set_epsilon_min();
    assert_eq!(agent.epsilon(), 0.1);
    Ok(())
}

#[test]
fn test_empty_batch_is_noop() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![16]).decay_interval(1))?;
    let q = agent.q_values(&state(0))?;

    assert_eq!(agent.update(&batch(0))?, None);
    assert_eq!(agent.update_count(), 0);
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.q_values(&state(0))?, q);
    Ok(())
}

#[test]
fn test_per_transition_update_counts_once() -> Result<()> {
    let config = config(vec![16]).update_mode(UpdateMode::PerTransition);
    let mut agent = DqnAgent::build(config)?;
    let q = agent.q_values(&state(0))?;

    assert!(agent.update(&batch(8))?.is_some());
    assert_eq!(agent.update_count(), 1);
    assert_ne!(agent.q_values(&state(0))?, q);
    Ok(())
}

#[test]
fn test_opt_skips_until_buffer_holds_a_batch() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![16]))?;
    let mut buffer = Buffer::build(&ReplayBufferConfig::default());

    for i in 0..63 {
        buffer.push(transition(i))?;
    }
    assert!(agent.opt(&mut buffer)?.is_none());
    assert_eq!(agent.update_count(), 0);

    buffer.push(transition(63))?;
    let record = agent.opt(&mut buffer)?.expect("an update record");
    assert_eq!(agent.update_count(), 1);
    assert_eq!(record.get_scalar("update_count")?, 1.0);
    assert_eq!(record.get_scalar("epsilon")?, 1.0);
    assert!(record.get_scalar("loss")? > 0.0);
    Ok(())
}

#[test]
fn test_sample_rejects_state_of_wrong_dimension() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![16]))?;
    let err = agent.sample(&VecObs(vec![0.0; 5])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ArmDqnError>(),
        Some(&ArmDqnError::StateDimMismatch {
            expected: 6,
            got: 5
        })
    );
    Ok(())
}

#[test]
fn test_sample_returns_valid_actions() -> Result<()> {
    let mut agent = DqnAgent::build(config(vec![16]))?;
    for i in 0..100 {
        let a = agent.sample(&state(i))?;
        assert!(a.0 < 8);
    }

    let explorer = EpsilonGreedy::new().eps_min(0.0).eps_start(0.0);
    let mut agent = DqnAgent::build(config(vec![16]).explorer(explorer))?;
    for i in 0..10 {
        let q = agent.q_values(&state(i))?;
        let a = agent.sample(&state(i))?;
        assert!(q.iter().all(|v| *v <= q[a.0]));
    }
    Ok(())
}

#[test]
fn test_save_and_load_params() -> Result<()> {
    let dir = TempDir::new("dqn")?;
    let mut agent = DqnAgent::build(config(vec![64, 64, 64]))?;
    agent.update(&batch(64))?;
    agent.save_params(dir.path())?;

    let mut agent_ = DqnAgent::build(config(vec![64, 64, 64]))?;
    agent_.load_params(dir.path())?;
    for i in 0..5 {
        let q = agent.q_values(&state(i))?;
        assert_close(&q, &agent_.q_values(&state(i))?);
        assert_close(&q, &agent_.target_q_values(&state(i))?);
    }
    Ok(())
}

#[test]
fn test_load_params_of_another_architecture_fails() -> Result<()> {
    let dir = TempDir::new("dqn")?;
    let agent = DqnAgent::build(config(vec![32, 32]))?;
    agent.save_params(dir.path())?;

    let mut agent_ = DqnAgent::build(config(vec![64, 64, 64]))?;
    assert!(agent_.load_params(dir.path()).is_err());

    let mut agent_ = DqnAgent::build(config(vec![64, 64]))?;
    assert!(agent_.load_params(dir.path()).is_err());
    Ok(())
}
