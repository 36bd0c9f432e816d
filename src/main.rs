use anyhow::{Context, Result};
use exam_proctor::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logger::init_with(config.verbose_logging);

    let mut args = std::env::args().skip(1);
    let exam_id = args.next().context("用法: exam-proctor <exam_id> <student_id>")?;
    let student_id = args.next().context("用法: exam-proctor <exam_id> <student_id>")?;

    // 初始化并运行应用
    App::initialize(config, exam_id, student_id).run().await?;

    Ok(())
}
