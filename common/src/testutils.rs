async fn create_temp_dir() -> anyhow::Result<std::path::PathBuf> {
    let mut idx = 0;
    loop {
        let tmp_dir = std::env::temp_dir().join(format!("cpy_test{}", &idx));
        if let Err(error) = tokio::fs::create_dir(&tmp_dir).await {
            match error.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    idx += 1;
                }
                _ => return Err(error.into()),
            }
        } else {
            return Ok(tmp_dir);
        }
    }
}

pub async fn setup_test_dir() -> anyhow::Result<std::path::PathBuf> {
    // create a temporary directory
    let tmp_dir = create_temp_dir().await?;
    // src
    // |- a.txt
    // |- b.png
    // |- goat.png
    // |- .env
    // |- x
    //    |- 1.png
    // |- y
    //    |- 2.png
    //    |- .cache
    //       |- c.png
    let src_path = tmp_dir.join("src");
    tokio::fs::create_dir(&src_path).await?;
    tokio::fs::write(src_path.join("a.txt"), "a").await?;
    tokio::fs::write(src_path.join("b.png"), "bb").await?;
    tokio::fs::write(src_path.join("goat.png"), "goat").await?;
    tokio::fs::write(src_path.join(".env"), "KEY=value").await?;
    let x_path = src_path.join("x");
    tokio::fs::create_dir(&x_path).await?;
    tokio::fs::write(x_path.join("1.png"), "1").await?;
    let y_path = src_path.join("y");
    tokio::fs::create_dir(&y_path).await?;
    tokio::fs::write(y_path.join("2.png"), "22").await?;
    let cache_path = y_path.join(".cache");
    tokio::fs::create_dir(&cache_path).await?;
    tokio::fs::write(cache_path.join("c.png"), "ccc").await?;
    Ok(tmp_dir)
}
