#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use leveled_ckks::{AlignmentPolicy, CkksEngine, CkksParameters, decrypt, encrypt};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "dhat-heap")]
    let _dhat = dhat::Profiler::new_heap();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let engine = CkksEngine::new(CkksParameters::n8192())?;
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let keys = engine.generate_keys(&mut rng)?;
    let encoder = engine.encoder();
    let evaluator = engine.evaluator();
    let scale = engine.context().default_scale();

    let x = [1.0, 2.0, 3.0];
    let y = [2.0, 3.0, 4.0];
    let z = [3.0, 4.0, 5.0];
    println!("x = {x:?}\ny = {y:?}\nz = {z:?}");

    let ct_x = encrypt(&encoder.encode(&x, scale)?, &keys.public, &mut rng)?;
    let ct_y = encrypt(&encoder.encode(&y, scale)?, &keys.public, &mut rng)?;
    let ct_z = encrypt(&encoder.encode(&z, scale)?, &keys.public, &mut rng)?;

    // x^2 at level L-1
    let x_sq = evaluator.multiply(&ct_x, &ct_x)?;
    let x_sq = evaluator.relinearize(&x_sq, &keys.relin)?;
    let x_sq = evaluator.rescale(&x_sq)?;

    // x^3 at level L-2; the fresh x joins at x_sq's level without a rescale
    let x_down = evaluator.mod_switch_to(&ct_x, x_sq.level())?;
    let x_cubed = evaluator.multiply(&x_sq, &x_down)?;
    let x_cubed = evaluator.relinearize(&x_cubed, &keys.relin)?;
    let x_cubed = evaluator.rescale(&x_cubed)?;

    // y*z at level L-1
    let yz = evaluator.multiply(&ct_y, &ct_z)?;
    let yz = evaluator.relinearize(&yz, &keys.relin)?;
    let yz = evaluator.rescale(&yz)?;

    println!(
        "x^3: level {} scale {:.6e}\ny*z: level {} scale {:.6e}",
        x_cubed.level(),
        x_cubed.scale(),
        yz.level(),
        yz.scale()
    );

    let policy = AlignmentPolicy::new(&evaluator).acknowledge_scale_drift(1e-5);
    let result = policy.add_aligned(&x_cubed, &yz)?;

    let decoded = encoder.decode(&decrypt(&result, &keys.secret)?)?;
    let expected: Vec<f64> = (0..x.len()).map(|i| x[i].powi(3) + y[i] * z[i]).collect();
    println!("x^3 + y*z = {:?}", &decoded[..x.len()]);
    println!("expected  = {expected:?}");

    Ok(())
}
