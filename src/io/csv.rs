use std::io::{self, Write};

use crate::sim::{BenchmarkRun, MotorRun};

/// Write a ball benchmark run to CSV format.
///
/// Columns: time, target_x, target_y, pos_x, pos_y, err_x, err_y,
///          cmd_x, cmd_y, angle_x, angle_y
pub fn write_benchmark<W: Write>(writer: &mut W, run: &BenchmarkRun, dt: f64) -> io::Result<()> {
    writeln!(
        writer,
        "time,target_x,target_y,pos_x,pos_y,err_x,err_y,\
         cmd_x,cmd_y,angle_x,angle_y"
    )?;

    for i in 0..run.target.len() {
        writeln!(
            writer,
            "{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},\
             {:.4},{:.4},{:.4},{:.4}",
            i as f64 * dt,
            run.target[i].x, run.target[i].y,
            run.trajectory[i].x, run.trajectory[i].y,
            run.error[i].x, run.error[i].y,
            run.command[i].x, run.command[i].y,
            run.angle[i].x, run.angle[i].y,
        )?;
    }

    Ok(())
}

/// Write a ball benchmark run to a CSV file at the given path.
pub fn write_benchmark_file(path: &str, run: &BenchmarkRun, dt: f64) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_benchmark(&mut file, run, dt)
}

/// Write a motor-only benchmark run to CSV format.
///
/// Columns: time, angle, err, cmd
pub fn write_motor_run<W: Write>(writer: &mut W, run: &MotorRun, dt: f64) -> io::Result<()> {
    writeln!(writer, "time,angle,err,cmd")?;
    for i in 0..run.trajectory.len() {
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4}",
            i as f64 * dt,
            run.trajectory[i],
            run.error[i],
            run.command[i],
        )?;
    }
    Ok(())
}

/// Write a motor-only run to a CSV file at the given path.
pub fn write_motor_run_file(path: &str, run: &MotorRun, dt: f64) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_motor_run(&mut file, run, dt)
}
