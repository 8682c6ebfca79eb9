use super::AppContext;
use anyhow::Result;
use nb_build::verify_installation;
use nb_core::nb_success;

pub fn handle_verify(ctx: &AppContext) -> Result<()> {
    let node = &ctx.config.node;
    let version = verify_installation(ctx.runner.as_ref(), &node.prefix, &node.version)?;
    nb_success!("{} reports {}", node.prefix.join("bin/node").display(), version);
    Ok(())
}
