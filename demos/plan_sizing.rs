#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use embedded_ckks_core::encoding::{self, EncodePlan};
use embedded_ckks_core::ntt;
use embedded_ckks_core::{CkksResult, IfftMode, NttMode, NttPlan, RnsParams, derive};
use tracing_subscriber::EnvFilter;

fn main() -> CkksResult<()> {
    #[cfg(feature = "dhat-heap")]
    let _dhat = dhat::Profiler::new_heap();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut params = RnsParams::preset(2048)?;
    params.ntt_mode = NttMode::Precomputed;
    params.ifft_mode = IfftMode::Precomputed;
    params.mempool_hint_bytes = params.plan_pool_bytes();
    let derived = derive(&params)?;

    let ntt_bytes = ntt::requirements(params.ring_dim, params.moduli(), params.ntt_mode)?;
    let enc_bytes = encoding::plan_requirements(params.ring_dim, params.ifft_mode)?;
    println!("ring_dim           {}", params.ring_dim);
    println!("moduli             {:?}", params.moduli());
    println!("ntt plan bytes     {ntt_bytes}");
    println!("encode plan bytes  {enc_bytes}");
    println!("total pool hint    {}", params.mempool_hint_bytes);

    // One pool, split between the two plans.
    let mut pool = vec![0u8; params.mempool_hint_bytes];
    let (ntt_pool, enc_pool) = pool.split_at_mut(ntt_bytes);
    let ntt_plan = NttPlan::init(
        params.ring_dim,
        params.moduli(),
        &derived,
        params.ntt_mode,
        Some(ntt_pool),
    )?;
    let enc_plan = EncodePlan::init(params.ring_dim, params.ifft_mode, Some(enc_pool))?;

    for i in 0..ntt_plan.num_q() {
        if let Some(header) = ntt_plan.header(i) {
            println!(
                "limb {i}: q = {}, psi = {}, n_inv = {}",
                header.q, header.psi, header.n_inv_mod_q
            );
        }
    }
    if let Some(w) = enc_plan.twiddle(params.ring_dim as usize / 8) {
        println!("twiddle N/8        {w}");
    }

    ntt_plan.free();
    enc_plan.free();
    Ok(())
}
