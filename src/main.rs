mod app_state;
mod block_factory;
mod color;
mod conv_shape;
mod handlers;
mod layout;
mod routes;
mod task;
mod voxel_grid;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};

use app_state::AppState;
use task::TaskStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let task_store = Arc::new(TaskStore::new());
    let app_state = web::Data::new(AppState {
        task_store: task_store.clone(),
    });

    // 启动后台清理任务：定期清理过期的任务
    // 每 5 分钟执行一次清理，避免未拉取的分块长期占用内存
    let cleanup_store = task_store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(std::time::Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            let cleaned_count = cleanup_store.cleanup_expired();
            if cleaned_count > 0 {
                println!(
                    "[清理任务] 清理了 {} 个过期任务，当前剩余: {} 个任务",
                    cleaned_count,
                    cleanup_store.task_count()
                );
            }
        }
    });

    println!("服务器启动在 http://127.0.0.1:8080");
    println!("任务 TTL: {} 分钟", task_store.default_ttl().as_secs() / 60);
    println!("\n可用接口:");
    println!("  GET / - API 信息");
    println!("  GET /conv-layout?w_in=&h_in=&channel_in=&filter_size=&channel_out=&padding=&stride= - 计算卷积布局");
    println!("  POST /conv-layout/preprocess - 预处理大布局并分块");
    println!("  GET /conv-layout/chunk?task_id=&chunk_index= - 拉取分块二进制数据");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
